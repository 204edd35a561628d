use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Users and their login sessions
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Email).unique_key())
                    .col(string(Users::PasswordHash))
                    .col(string(Users::Name))
                    .col(string_len(Users::Role, 20))
                    .col(timestamp_with_time_zone(Users::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(string(Sessions::Token).primary_key())
                    .col(integer(Sessions::UserId))
                    .col(timestamp_with_time_zone(Sessions::CreatedAt))
                    .col(timestamp_with_time_zone(Sessions::ExpiresAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_session_user")
                            .from(Sessions::Table, Sessions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Departments::Table)
                    .if_not_exists()
                    .col(pk_auto(Departments::Id))
                    .col(string(Departments::Name))
                    .col(text_null(Departments::Description))
                    .col(string_null(Departments::Head))
                    .col(timestamp_with_time_zone(Departments::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AcademicPeriods::Table)
                    .if_not_exists()
                    .col(pk_auto(AcademicPeriods::Id))
                    .col(string(AcademicPeriods::Name))
                    .col(date(AcademicPeriods::StartDate))
                    .col(date(AcademicPeriods::EndDate))
                    .col(boolean(AcademicPeriods::IsActive).default(false))
                    .col(timestamp_with_time_zone(AcademicPeriods::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Subjects::Table)
                    .if_not_exists()
                    .col(pk_auto(Subjects::Id))
                    .col(string(Subjects::Name))
                    .col(string(Subjects::Code).unique_key())
                    .col(text_null(Subjects::Description))
                    .col(integer(Subjects::Credits).default(3))
                    .col(integer_null(Subjects::DepartmentId))
                    .col(timestamp_with_time_zone(Subjects::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subject_department")
                            .from(Subjects::Table, Subjects::DepartmentId)
                            .to(Departments::Table, Departments::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Teachers::Table)
                    .if_not_exists()
                    .col(pk_auto(Teachers::Id))
                    .col(integer(Teachers::UserId).unique_key())
                    .col(string(Teachers::TeacherCode).unique_key())
                    .col(integer_null(Teachers::DepartmentId))
                    .col(string_null(Teachers::Specialization))
                    .col(string_null(Teachers::Phone))
                    .col(date(Teachers::HireDate))
                    .col(date_null(Teachers::ContractEndDate))
                    .col(string_len(Teachers::Status, 20).default("active"))
                    .col(timestamp_with_time_zone(Teachers::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teacher_user")
                            .from(Teachers::Table, Teachers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teacher_department")
                            .from(Teachers::Table, Teachers::DepartmentId)
                            .to(Departments::Table, Departments::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Students::Table)
                    .if_not_exists()
                    .col(pk_auto(Students::Id))
                    .col(integer(Students::UserId).unique_key())
                    .col(string(Students::StudentCode).unique_key())
                    .col(string(Students::GradeLevel))
                    .col(date_null(Students::DateOfBirth))
                    .col(text_null(Students::Address))
                    .col(string_null(Students::Phone))
                    .col(date(Students::EnrollmentDate))
                    .col(string_len(Students::Status, 20).default("active"))
                    .col(timestamp_with_time_zone(Students::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_student_user")
                            .from(Students::Table, Students::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(pk_auto(Courses::Id))
                    .col(integer(Courses::SubjectId))
                    .col(integer(Courses::TeacherId))
                    .col(integer(Courses::AcademicPeriodId))
                    .col(string(Courses::CourseCode).unique_key())
                    .col(integer(Courses::MaxStudents).default(30))
                    .col(string_len(Courses::Status, 20).default("active"))
                    .col(timestamp_with_time_zone(Courses::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_subject")
                            .from(Courses::Table, Courses::SubjectId)
                            .to(Subjects::Table, Subjects::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_teacher")
                            .from(Courses::Table, Courses::TeacherId)
                            .to(Teachers::Table, Teachers::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_period")
                            .from(Courses::Table, Courses::AcademicPeriodId)
                            .to(AcademicPeriods::Table, AcademicPeriods::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Enrollments::Table)
                    .if_not_exists()
                    .col(pk_auto(Enrollments::Id))
                    .col(integer(Enrollments::StudentId))
                    .col(integer(Enrollments::CourseId))
                    .col(timestamp_with_time_zone(Enrollments::EnrollmentDate))
                    .col(string_len(Enrollments::Status, 20).default("enrolled"))
                    .col(decimal_null(Enrollments::FinalGrade).decimal_len(5, 2))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollment_student")
                            .from(Enrollments::Table, Enrollments::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollment_course")
                            .from(Enrollments::Table, Enrollments::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_enrollment_student_course")
                    .table(Enrollments::Table)
                    .col(Enrollments::StudentId)
                    .col(Enrollments::CourseId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Grades::Table)
                    .if_not_exists()
                    .col(pk_auto(Grades::Id))
                    .col(integer(Grades::EnrollmentId))
                    .col(string(Grades::AssessmentType))
                    .col(string(Grades::AssessmentName))
                    .col(decimal(Grades::Score).decimal_len(5, 2))
                    .col(decimal(Grades::MaxScore).decimal_len(5, 2).default(100))
                    .col(decimal_null(Grades::Weight).decimal_len(5, 2))
                    .col(date(Grades::AssessmentDate))
                    .col(timestamp_with_time_zone(Grades::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_grade_enrollment")
                            .from(Grades::Table, Grades::EnrollmentId)
                            .to(Enrollments::Table, Enrollments::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Attendance::Table)
                    .if_not_exists()
                    .col(pk_auto(Attendance::Id))
                    .col(integer(Attendance::EnrollmentId))
                    .col(date(Attendance::Date))
                    .col(string_len(Attendance::Status, 20))
                    .col(text_null(Attendance::Notes))
                    .col(timestamp_with_time_zone(Attendance::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendance_enrollment")
                            .from(Attendance::Table, Attendance::EnrollmentId)
                            .to(Enrollments::Table, Enrollments::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_attendance_enrollment_date")
                    .table(Attendance::Table)
                    .col(Attendance::EnrollmentId)
                    .col(Attendance::Date)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Schedules::Table)
                    .if_not_exists()
                    .col(pk_auto(Schedules::Id))
                    .col(integer(Schedules::CourseId))
                    .col(string_len(Schedules::DayOfWeek, 10))
                    .col(time(Schedules::StartTime))
                    .col(time(Schedules::EndTime))
                    .col(string_null(Schedules::Classroom))
                    .col(timestamp_with_time_zone(Schedules::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_schedule_course")
                            .from(Schedules::Table, Schedules::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Children before parents
        manager
            .drop_table(Table::drop().table(Schedules::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Attendance::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Grades::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Enrollments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Students::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Teachers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Subjects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AcademicPeriods::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Departments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sessions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    PasswordHash,
    Name,
    Role,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Sessions {
    Table,
    Token,
    UserId,
    CreatedAt,
    ExpiresAt,
}

#[derive(DeriveIden)]
enum Departments {
    Table,
    Id,
    Name,
    Description,
    Head,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AcademicPeriods {
    Table,
    Id,
    Name,
    StartDate,
    EndDate,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Subjects {
    Table,
    Id,
    Name,
    Code,
    Description,
    Credits,
    DepartmentId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Teachers {
    Table,
    Id,
    UserId,
    TeacherCode,
    DepartmentId,
    Specialization,
    Phone,
    HireDate,
    ContractEndDate,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Students {
    Table,
    Id,
    UserId,
    StudentCode,
    GradeLevel,
    DateOfBirth,
    Address,
    Phone,
    EnrollmentDate,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Courses {
    Table,
    Id,
    SubjectId,
    TeacherId,
    AcademicPeriodId,
    CourseCode,
    MaxStudents,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Enrollments {
    Table,
    Id,
    StudentId,
    CourseId,
    EnrollmentDate,
    Status,
    FinalGrade,
}

#[derive(DeriveIden)]
enum Grades {
    Table,
    Id,
    EnrollmentId,
    AssessmentType,
    AssessmentName,
    Score,
    MaxScore,
    Weight,
    AssessmentDate,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Attendance {
    Table,
    Id,
    EnrollmentId,
    Date,
    Status,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Schedules {
    Table,
    Id,
    CourseId,
    DayOfWeek,
    StartTime,
    EndTime,
    Classroom,
    CreatedAt,
}
