pub mod accrual;
pub mod calendar;
