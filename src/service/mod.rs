pub mod accrual;
pub mod decision;
pub mod hierarchy;
pub mod notification;
pub mod validation;
