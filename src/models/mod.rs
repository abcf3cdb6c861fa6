pub mod metric;
pub mod profile;
pub mod user;
pub mod workout;

pub use metric::{DailyMetric, NewDailyMetric};
pub use profile::{FitnessLevel, Gender, Goal, UserProfile};
pub use user::User;
pub use workout::{NewWorkoutEntry, WorkoutEntry};
