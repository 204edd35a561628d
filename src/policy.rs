//! Who may do what. Every protected handler asks [`authorize`] before it
//! touches the database.

use model::entities::user::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Users,
    Departments,
    AcademicPeriods,
    Subjects,
    Teachers,
    Students,
    Courses,
    Enrollments,
    Grades,
    Attendance,
    Schedules,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

pub fn authorize(role: Role, resource: Resource, action: Action) -> bool {
    use Resource::*;

    if action == Action::Read || role == Role::Admin {
        return true;
    }

    match (role, resource) {
        // Teachers run their classes but cannot remove courses or enrollments
        (Role::Teacher, Courses | Enrollments) => action != Action::Delete,
        (Role::Teacher, Grades | Attendance) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_RESOURCES: [Resource; 12] = [
        Resource::Users,
        Resource::Departments,
        Resource::AcademicPeriods,
        Resource::Subjects,
        Resource::Teachers,
        Resource::Students,
        Resource::Courses,
        Resource::Enrollments,
        Resource::Grades,
        Resource::Attendance,
        Resource::Schedules,
        Resource::Dashboard,
    ];
    const WRITES: [Action; 3] = [Action::Create, Action::Update, Action::Delete];

    #[test]
    fn test_everyone_reads() {
        for role in [Role::Admin, Role::Teacher, Role::Student] {
            for resource in ALL_RESOURCES {
                assert!(authorize(role, resource, Action::Read), "{:?} {:?}", role, resource);
            }
        }
    }

    #[test]
    fn test_admin_writes_everything() {
        for resource in ALL_RESOURCES {
            for action in WRITES {
                assert!(authorize(Role::Admin, resource, action));
            }
        }
    }

    #[test]
    fn test_student_writes_nothing() {
        for resource in ALL_RESOURCES {
            for action in WRITES {
                assert!(!authorize(Role::Student, resource, action), "{:?} {:?}", resource, action);
            }
        }
    }

    #[test]
    fn test_teacher_matrix() {
        for resource in [Resource::Grades, Resource::Attendance] {
            for action in WRITES {
                assert!(authorize(Role::Teacher, resource, action));
            }
        }
        for resource in [Resource::Courses, Resource::Enrollments] {
            assert!(authorize(Role::Teacher, resource, Action::Create));
            assert!(authorize(Role::Teacher, resource, Action::Update));
            assert!(!authorize(Role::Teacher, resource, Action::Delete));
        }
        for resource in [
            Resource::Users,
            Resource::Departments,
            Resource::AcademicPeriods,
            Resource::Subjects,
            Resource::Teachers,
            Resource::Students,
            Resource::Schedules,
        ] {
            for action in WRITES {
                assert!(!authorize(Role::Teacher, resource, action), "{:?} {:?}", resource, action);
            }
        }
    }
}
