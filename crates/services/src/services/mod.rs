pub mod assignment;
pub mod capacity;
pub mod eligibility;
pub mod review_session;
