pub mod attendance_queries;
pub mod group_queries;
pub mod points_queries;
