//! SeaORM entities for the school management schema.
//!
//! Users carry a role and may own a student or teacher profile. Courses tie a
//! subject, a teacher and an academic period together; students join courses
//! through enrollments, which in turn own grades and attendance records.

pub mod academic_period;
pub mod attendance;
pub mod course;
pub mod department;
pub mod enrollment;
pub mod grade;
pub mod schedule;
pub mod session;
pub mod student;
pub mod subject;
pub mod teacher;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::academic_period::Entity as AcademicPeriod;
    pub use super::attendance::Entity as Attendance;
    pub use super::course::Entity as Course;
    pub use super::department::Entity as Department;
    pub use super::enrollment::Entity as Enrollment;
    pub use super::grade::Entity as Grade;
    pub use super::schedule::Entity as Schedule;
    pub use super::session::Entity as Session;
    pub use super::student::Entity as Student;
    pub use super::subject::Entity as Subject;
    pub use super::teacher::Entity as Teacher;
    pub use super::user::Entity as User;
}
