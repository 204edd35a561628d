#[cfg(test)]
mod integration_tests {
    use crate::schemas::{ApiResponse, ErrorResponse, HealthResponse};
    use crate::test_utils::{bearer, TestApp, PASSWORD};
    use axum::http::StatusCode;
    use axum_test::TestResponse;
    use chrono::Duration;
    use model::entities::user::Role;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};

    async fn get(app: &TestApp, token: &str, path: &str) -> TestResponse {
        let (name, value) = bearer(token);
        app.server.get(path).add_header(name, value).await
    }

    async fn post(app: &TestApp, token: &str, path: &str, body: Value) -> TestResponse {
        let (name, value) = bearer(token);
        app.server.post(path).add_header(name, value).json(&body).await
    }

    async fn put(app: &TestApp, token: &str, path: &str, body: Value) -> TestResponse {
        let (name, value) = bearer(token);
        app.server.put(path).add_header(name, value).json(&body).await
    }

    async fn delete(app: &TestApp, token: &str, path: &str) -> TestResponse {
        let (name, value) = bearer(token);
        app.server.delete(path).add_header(name, value).await
    }

    fn data(response: &TestResponse) -> Value {
        let body: ApiResponse<Value> = response.json();
        assert!(body.success);
        body.data
    }

    fn id_of(response: &TestResponse) -> i64 {
        data(response)["id"].as_i64().unwrap()
    }

    fn decimal(value: &Value) -> Decimal {
        value.as_str().unwrap().parse().unwrap()
    }

    async fn login(app: &TestApp, email: &str, password: &str) -> TestResponse {
        app.server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .await
    }

    /// Ids and tokens of a small school: one course taught by one teacher
    struct School {
        admin: String,
        teacher: String,
        student: String,
        student_id: i64,
        course_id: i64,
    }

    async fn school(app: &TestApp, max_students: i32) -> School {
        let admin = app.admin_token().await;

        let department = post(
            app,
            &admin,
            "/api/v1/departments",
            json!({ "name": "Sciences", "description": "Maths and physics" }),
        )
        .await;
        department.assert_status(StatusCode::CREATED);
        let department_id = id_of(&department);

        let period = post(
            app,
            &admin,
            "/api/v1/academic-periods",
            json!({ "name": "2024 Fall", "startDate": "2024-09-01", "endDate": "2024-12-20", "isActive": true }),
        )
        .await;
        period.assert_status(StatusCode::CREATED);

        let subject = post(
            app,
            &admin,
            "/api/v1/subjects",
            json!({ "name": "Calculus", "code": "CALC101", "credits": 4, "departmentId": department_id }),
        )
        .await;
        subject.assert_status(StatusCode::CREATED);

        let teacher = post(
            app,
            &admin,
            "/api/v1/teachers/accounts",
            json!({
                "email": "teacher@example.com",
                "password": PASSWORD,
                "name": "Ada Teacher",
                "departmentId": department_id
            }),
        )
        .await;
        teacher.assert_status(StatusCode::CREATED);
        let teacher_id = data(&teacher)["teacher"]["id"].as_i64().unwrap();

        let student = post(
            app,
            &admin,
            "/api/v1/students/accounts",
            json!({
                "email": "student@example.com",
                "password": PASSWORD,
                "name": "Sam Student",
                "gradeLevel": "10A"
            }),
        )
        .await;
        student.assert_status(StatusCode::CREATED);
        let student_id = data(&student)["student"]["id"].as_i64().unwrap();

        let course = post(
            app,
            &admin,
            "/api/v1/courses",
            json!({
                "subjectId": id_of(&subject),
                "teacherId": teacher_id,
                "academicPeriodId": id_of(&period),
                "courseCode": "CALC101-A",
                "maxStudents": max_students
            }),
        )
        .await;
        course.assert_status(StatusCode::CREATED);

        let teacher_login = login(app, "teacher@example.com", PASSWORD).await;
        teacher_login.assert_status(StatusCode::OK);
        let student_login = login(app, "student@example.com", PASSWORD).await;
        student_login.assert_status(StatusCode::OK);

        School {
            admin,
            teacher: data(&teacher_login)["token"].as_str().unwrap().to_string(),
            student: data(&student_login)["token"].as_str().unwrap().to_string(),
            student_id,
            course_id: id_of(&course),
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = TestApp::new().await;

        let response = app.server.get("/health").await;

        response.assert_status(StatusCode::OK);
        let body: HealthResponse = response.json();
        assert_eq!(body.status, "healthy");
        assert_eq!(body.database, "connected");
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let app = TestApp::new().await;

        let response = app.server.get("/api/v1/departments").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: ErrorResponse = response.json();
        assert!(!body.success);
        assert_eq!(body.code, "UNAUTHORIZED");

        let response = get(&app, "not-a-session", "/api/v1/departments").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected() {
        let app = TestApp::new().await;
        let user = app.create_user("late@example.com", Role::Student).await;
        let session = store::sessions::open(app.db(), user.id, Duration::seconds(-1))
            .await
            .unwrap();

        let response = get(&app, &session.token, "/api/v1/auth/me").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_login_me_logout() {
        let app = TestApp::new().await;

        // Register as a student
        let response = app
            .server
            .post("/api/v1/auth/register")
            .json(&json!({
                "email": "new@example.com",
                "password": PASSWORD,
                "name": "New Student",
                "role": "student"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let session = data(&response);
        assert_eq!(session["user"]["email"], "new@example.com");
        assert!(session["user"].get("passwordHash").is_none());

        // The registration token is usable right away
        let me = get(&app, session["token"].as_str().unwrap(), "/api/v1/auth/me").await;
        me.assert_status(StatusCode::OK);
        let me = data(&me);
        assert_eq!(me["user"]["role"], "student");
        let code = me["student"]["studentCode"].as_str().unwrap();
        assert!(code.starts_with("STU-"));
        assert!(me["teacher"].is_null());

        // Log in again and log out
        let response = login(&app, "new@example.com", PASSWORD).await;
        response.assert_status(StatusCode::OK);
        let token = data(&response)["token"].as_str().unwrap().to_string();

        post(&app, &token, "/api/v1/auth/logout", json!({}))
            .await
            .assert_status(StatusCode::OK);
        get(&app, &token, "/api/v1/auth/me")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_cannot_choose_admin_role() {
        let app = TestApp::new().await;

        let response = app
            .server
            .post("/api/v1/auth/register")
            .json(&json!({
                "email": "sneaky@example.com",
                "password": PASSWORD,
                "name": "Sneaky",
                "role": "admin"
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_register_rejects_short_password_and_bad_email() {
        let app = TestApp::new().await;

        for (email, password) in [("short@example.com", "123"), ("not-an-email", PASSWORD)] {
            let response = app
                .server
                .post("/api/v1/auth/register")
                .json(&json!({ "email": email, "password": password, "name": "X", "role": "student" }))
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_login_error_does_not_reveal_which_part_is_wrong() {
        let app = TestApp::new().await;
        app.create_user("known@example.com", Role::Teacher).await;

        let wrong_password = login(&app, "known@example.com", "wrong-password").await;
        wrong_password.assert_status(StatusCode::UNAUTHORIZED);
        let unknown_email = login(&app, "nobody@example.com", PASSWORD).await;
        unknown_email.assert_status(StatusCode::UNAUTHORIZED);

        let first: ErrorResponse = wrong_password.json();
        let second: ErrorResponse = unknown_email.json();
        assert_eq!(first.code, "INVALID_CREDENTIALS");
        assert_eq!(first.error, second.error);
    }

    #[tokio::test]
    async fn test_unreadable_body_is_a_validation_error() {
        let app = TestApp::new().await;
        let admin = app.admin_token().await;

        let wrong_type = post(&app, &admin, "/api/v1/departments", json!({ "name": 5 })).await;
        wrong_type.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = wrong_type.json();
        assert_eq!(body.code, "VALIDATION_ERROR");
        assert!(!body.success);

        let (name, value) = bearer(&admin);
        let broken = app
            .server
            .post("/api/v1/departments")
            .add_header(name, value)
            .text("{\"name\": ")
            .content_type("application/json")
            .await;
        broken.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = broken.json();
        assert_eq!(body.code, "VALIDATION_ERROR");

        // Nothing was created
        let listed = data(&get(&app, &admin, "/api/v1/departments").await);
        assert_eq!(listed.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_student_cannot_create_department() {
        let app = TestApp::new().await;
        let student = app.token_for("student@example.com", Role::Student).await;

        let response = post(&app, &student, "/api/v1/departments", json!({ "name": "Arts" })).await;

        response.assert_status(StatusCode::FORBIDDEN);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "FORBIDDEN");

        // Reading is open to every role
        get(&app, &student, "/api/v1/departments")
            .await
            .assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_department_crud() {
        let app = TestApp::new().await;
        let admin = app.admin_token().await;

        let created = post(
            &app,
            &admin,
            "/api/v1/departments",
            json!({ "name": "Humanities", "description": "History", "head": "Dr. Who" }),
        )
        .await;
        created.assert_status(StatusCode::CREATED);
        let id = id_of(&created);

        let fetched = get(&app, &admin, &format!("/api/v1/departments/{}", id)).await;
        fetched.assert_status(StatusCode::OK);
        let fetched = data(&fetched);
        assert_eq!(fetched["id"].as_i64().unwrap(), id);
        assert_eq!(fetched["name"], "Humanities");
        assert_eq!(fetched["head"], "Dr. Who");

        // Only the named field changes
        let updated = put(
            &app,
            &admin,
            &format!("/api/v1/departments/{}", id),
            json!({ "description": "History and geography" }),
        )
        .await;
        updated.assert_status(StatusCode::OK);
        let updated = data(&updated);
        assert_eq!(updated["description"], "History and geography");
        assert_eq!(updated["name"], "Humanities");
        assert_eq!(updated["head"], "Dr. Who");

        // Explicit null clears a nullable field
        let cleared = put(&app, &admin, &format!("/api/v1/departments/{}", id), json!({ "head": null })).await;
        cleared.assert_status(StatusCode::OK);
        assert!(data(&cleared)["head"].is_null());

        delete(&app, &admin, &format!("/api/v1/departments/{}", id))
            .await
            .assert_status(StatusCode::OK);
        get(&app, &admin, &format!("/api/v1/departments/{}", id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        delete(&app, &admin, &format!("/api/v1/departments/{}", id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email() {
        let app = TestApp::new().await;
        let admin = app.admin_token().await;
        let request = json!({
            "email": "dup@example.com",
            "password": PASSWORD,
            "name": "Dup",
            "role": "teacher"
        });

        post(&app, &admin, "/api/v1/users", request.clone())
            .await
            .assert_status(StatusCode::CREATED);
        let response = post(&app, &admin, "/api/v1/users", request).await;

        response.assert_status(StatusCode::CONFLICT);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "CONFLICT");
    }

    #[tokio::test]
    async fn test_change_own_password() {
        let app = TestApp::new().await;
        let user = app.create_user("pw@example.com", Role::Student).await;
        let token = store::sessions::open(app.db(), user.id, Duration::hours(1))
            .await
            .unwrap()
            .token;

        // Someone else's password is off limits
        let other = app.create_user("other@example.com", Role::Student).await;
        put(
            &app,
            &token,
            &format!("/api/v1/users/{}/password", other.id),
            json!({ "password": "hijacked" }),
        )
        .await
        .assert_status(StatusCode::FORBIDDEN);

        put(
            &app,
            &token,
            &format!("/api/v1/users/{}/password", user.id),
            json!({ "password": "brand-new-pass" }),
        )
        .await
        .assert_status(StatusCode::OK);

        login(&app, "pw@example.com", PASSWORD)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        login(&app, "pw@example.com", "brand-new-pass")
            .await
            .assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_only_one_active_academic_period() {
        let app = TestApp::new().await;
        let admin = app.admin_token().await;

        get(&app, &admin, "/api/v1/academic-periods/active")
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let fall = post(
            &app,
            &admin,
            "/api/v1/academic-periods",
            json!({ "name": "Fall", "startDate": "2024-09-01", "endDate": "2024-12-20", "isActive": true }),
        )
        .await;
        let spring = post(
            &app,
            &admin,
            "/api/v1/academic-periods",
            json!({ "name": "Spring", "startDate": "2025-01-10", "endDate": "2025-06-01" }),
        )
        .await;
        let spring_id = id_of(&spring);

        post(&app, &admin, &format!("/api/v1/academic-periods/{}/activate", spring_id), json!({}))
            .await
            .assert_status(StatusCode::OK);

        let active = get(&app, &admin, "/api/v1/academic-periods/active").await;
        active.assert_status(StatusCode::OK);
        assert_eq!(data(&active)["id"].as_i64().unwrap(), spring_id);

        let fall = get(&app, &admin, &format!("/api/v1/academic-periods/{}", id_of(&fall))).await;
        assert_eq!(data(&fall)["isActive"], false);
    }

    #[tokio::test]
    async fn test_academic_period_rejects_inverted_dates() {
        let app = TestApp::new().await;
        let admin = app.admin_token().await;

        let response = post(
            &app,
            &admin,
            "/api/v1/academic-periods",
            json!({ "name": "Backwards", "startDate": "2025-06-01", "endDate": "2025-01-01" }),
        )
        .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_enrollment_grades_and_attendance_scenario() {
        let app = TestApp::new().await;
        let school = school(&app, 30).await;

        // The teacher enrolls the student
        let enrollment = post(
            &app,
            &school.teacher,
            "/api/v1/enrollments",
            json!({ "studentId": school.student_id, "courseId": school.course_id }),
        )
        .await;
        enrollment.assert_status(StatusCode::CREATED);
        let enrollment = data(&enrollment);
        assert_eq!(enrollment["status"], "enrolled");
        assert!(enrollment["finalGrade"].is_null());
        let enrollment_id = enrollment["id"].as_i64().unwrap();

        // Enrolling twice is a conflict
        let duplicate = post(
            &app,
            &school.teacher,
            "/api/v1/enrollments",
            json!({ "studentId": school.student_id, "courseId": school.course_id }),
        )
        .await;
        duplicate.assert_status(StatusCode::CONFLICT);

        // The student sees the course
        let courses = get(&app, &school.student, &format!("/api/v1/students/{}/courses", school.student_id)).await;
        courses.assert_status(StatusCode::OK);
        assert_eq!(data(&courses).as_array().unwrap().len(), 1);

        // Two grades: 80% and 90%
        for (kind, score, max) in [("exam", "80", "100"), ("homework", "45", "50")] {
            post(
                &app,
                &school.teacher,
                "/api/v1/grades",
                json!({ "enrollmentId": enrollment_id, "assessmentType": kind, "score": score, "maxScore": max }),
            )
            .await
            .assert_status(StatusCode::CREATED);
        }

        // A score above the maximum is rejected
        post(
            &app,
            &school.teacher,
            "/api/v1/grades",
            json!({ "enrollmentId": enrollment_id, "assessmentType": "quiz", "score": "11", "maxScore": "10" }),
        )
        .await
        .assert_status(StatusCode::BAD_REQUEST);

        let grades = get(&app, &school.student, &format!("/api/v1/enrollments/{}/grades", enrollment_id)).await;
        grades.assert_status(StatusCode::OK);
        assert_eq!(data(&grades).as_array().unwrap().len(), 2);

        let average = get(&app, &school.teacher, &format!("/api/v1/enrollments/{}/average", enrollment_id)).await;
        average.assert_status(StatusCode::OK);
        assert_eq!(decimal(&data(&average)["average"]), Decimal::new(85, 0));

        // Students cannot finalize
        post(&app, &school.student, &format!("/api/v1/enrollments/{}/finalize", enrollment_id), json!({}))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let finalized = post(
            &app,
            &school.teacher,
            &format!("/api/v1/enrollments/{}/finalize", enrollment_id),
            json!({}),
        )
        .await;
        finalized.assert_status(StatusCode::OK);
        assert_eq!(decimal(&data(&finalized)["finalGrade"]), Decimal::new(85, 0));

        // Three days: present, absent, late
        for (day, status) in [("2024-09-02", "present"), ("2024-09-03", "absent"), ("2024-09-04", "late")] {
            post(
                &app,
                &school.teacher,
                "/api/v1/attendance/record",
                json!({ "enrollmentId": enrollment_id, "date": day, "status": status }),
            )
            .await
            .assert_status(StatusCode::OK);
        }

        // Recording the same day again replaces the status
        let corrected = post(
            &app,
            &school.teacher,
            "/api/v1/attendance/record",
            json!({ "enrollmentId": enrollment_id, "date": "2024-09-04", "status": "late", "notes": "Bus delay" }),
        )
        .await;
        corrected.assert_status(StatusCode::OK);
        assert_eq!(data(&corrected)["notes"], "Bus delay");

        let summary = get(
            &app,
            &school.student,
            &format!("/api/v1/enrollments/{}/attendance/summary", enrollment_id),
        )
        .await;
        summary.assert_status(StatusCode::OK);
        let summary = data(&summary);
        assert_eq!(summary["total"], 3);
        assert_eq!(summary["present"], 1);
        assert_eq!(summary["absent"], 1);
        assert_eq!(summary["late"], 1);
        assert_eq!(summary["percentage"].as_f64(), Some(33.3));

        // Deleting the enrollment takes its grades and attendance along
        delete(&app, &school.admin, &format!("/api/v1/enrollments/{}", enrollment_id))
            .await
            .assert_status(StatusCode::OK);
        let grades = get(&app, &school.admin, "/api/v1/grades").await;
        assert!(data(&grades).as_array().unwrap().is_empty());
        let attendance = get(&app, &school.admin, "/api/v1/attendance").await;
        assert!(data(&attendance).as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_enrollment_respects_course_capacity() {
        let app = TestApp::new().await;
        let school = school(&app, 1).await;

        post(
            &app,
            &school.admin,
            "/api/v1/enrollments",
            json!({ "studentId": school.student_id, "courseId": school.course_id }),
        )
        .await
        .assert_status(StatusCode::CREATED);

        let second = post(
            &app,
            &school.admin,
            "/api/v1/students/accounts",
            json!({ "email": "second@example.com", "password": PASSWORD, "name": "Second", "gradeLevel": "10B" }),
        )
        .await;
        second.assert_status(StatusCode::CREATED);
        let second_id = data(&second)["student"]["id"].as_i64().unwrap();

        let response = post(
            &app,
            &school.admin,
            "/api/v1/enrollments",
            json!({ "studentId": second_id, "courseId": school.course_id }),
        )
        .await;

        response.assert_status(StatusCode::CONFLICT);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "COURSE_FULL");
    }

    #[tokio::test]
    async fn test_enrollment_filters() {
        let app = TestApp::new().await;
        let school = school(&app, 30).await;

        post(
            &app,
            &school.admin,
            "/api/v1/enrollments",
            json!({ "studentId": school.student_id, "courseId": school.course_id }),
        )
        .await
        .assert_status(StatusCode::CREATED);

        let by_course = get(
            &app,
            &school.admin,
            &format!("/api/v1/enrollments?courseId={}", school.course_id),
        )
        .await;
        by_course.assert_status(StatusCode::OK);
        assert_eq!(data(&by_course).as_array().unwrap().len(), 1);

        let by_other_student = get(&app, &school.admin, "/api/v1/enrollments?studentId=9999").await;
        by_other_student.assert_status(StatusCode::OK);
        assert!(data(&by_other_student).as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_teacher_cannot_delete_course() {
        let app = TestApp::new().await;
        let school = school(&app, 30).await;
        let path = format!("/api/v1/courses/{}", school.course_id);

        put(&app, &school.teacher, &path, json!({ "maxStudents": 25 }))
            .await
            .assert_status(StatusCode::OK);
        delete(&app, &school.teacher, &path)
            .await
            .assert_status(StatusCode::FORBIDDEN);
        delete(&app, &school.admin, &path)
            .await
            .assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_schedule_overlap_is_rejected() {
        let app = TestApp::new().await;
        let school = school(&app, 30).await;

        let slot = |start: &str, end: &str| {
            json!({
                "courseId": school.course_id,
                "dayOfWeek": "monday",
                "startTime": start,
                "endTime": end,
                "classroom": "B12"
            })
        };

        post(&app, &school.admin, "/api/v1/schedules", slot("09:00:00", "10:30:00"))
            .await
            .assert_status(StatusCode::CREATED);
        post(&app, &school.admin, "/api/v1/schedules", slot("10:00:00", "11:00:00"))
            .await
            .assert_status(StatusCode::CONFLICT);
        post(&app, &school.admin, "/api/v1/schedules", slot("11:00:00", "10:00:00"))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let schedules = get(&app, &school.student, &format!("/api/v1/courses/{}/schedules", school.course_id)).await;
        schedules.assert_status(StatusCode::OK);
        assert_eq!(data(&schedules).as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dashboard_statistics() {
        let app = TestApp::new().await;
        let school = school(&app, 30).await;

        let response = get(&app, &school.student, "/api/v1/dashboard/statistics").await;

        response.assert_status(StatusCode::OK);
        let stats = data(&response);
        assert_eq!(stats["totalStudents"], 1);
        assert_eq!(stats["totalTeachers"], 1);
        assert_eq!(stats["activeCourses"], 1);
        assert_eq!(stats["totalDepartments"], 1);
    }
}
