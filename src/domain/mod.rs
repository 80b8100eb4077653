pub mod accrual;
pub mod event;
pub mod operation;
pub mod pool;
pub mod ports;
