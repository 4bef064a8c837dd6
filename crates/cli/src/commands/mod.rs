pub mod rbac;
pub mod spread;
