// Domain layer - pure types and rules, no I/O
pub mod breach;
pub mod dashboard;
pub mod selection;
pub mod sensor;
pub mod status;
pub mod timestamp;
pub mod viewport;
