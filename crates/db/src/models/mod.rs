pub mod applicant;
pub mod review;
pub mod task;
