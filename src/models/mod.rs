// Core domain models
pub mod delivery_run;
pub mod order;
pub mod storage_drawer;
