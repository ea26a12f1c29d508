mod bearer;

pub use bearer::Bearer;
