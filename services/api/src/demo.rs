use chrono::{DateTime, Duration, Utc};
use clap::Args;

use campus_placement::config::AuthConfig;
use campus_placement::error::AppError;
use campus_placement::workflows::applications::{
    InterviewMode, PackageBreakdown, StageChangeRequest, StageDetails,
};
use campus_placement::workflows::assessments::{
    AnswerOptions, AnswerRequest, Difficulty, QuestionDraft, QuestionSetDraft,
};
use campus_placement::workflows::identity::{LoginRequest, Principal, RegistrationRequest};
use campus_placement::workflows::jobs::{Job, JobDraft, JobTimeline};
use campus_placement::workflows::notifications::DailyUpdatesQuery;
use campus_placement::PlacementState;

use crate::infra::{placement_state, run_maintenance};

const DEMO_PASSWORD: &str = "demo-password";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Skip the quiz and leaderboard portion of the demo.
    #[arg(long)]
    pub(crate) skip_assessment: bool,
    /// Print the leaderboard as JSON instead of a table.
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct SweepArgs {
    /// Hours since the expired job's online test took place.
    #[arg(long, default_value_t = 2)]
    pub(crate) hours_overdue: i64,
}

fn demo_auth() -> AuthConfig {
    AuthConfig {
        token_secret: "campus-placement-demo".to_string(),
        token_ttl_hours: 1,
    }
}

fn registration(role: &str, name: &str, email: &str) -> RegistrationRequest {
    let mut request = RegistrationRequest {
        name: Some(name.to_string()),
        email: Some(email.to_string()),
        password: Some(DEMO_PASSWORD.to_string()),
        role: Some(role.to_string()),
        ..RegistrationRequest::default()
    };
    match role {
        "student" => {
            request.roll_number = Some(email.split('@').next().unwrap_or(email).to_uppercase());
            request.branch = Some("CSE".to_string());
            request.graduation_year = Some(2026);
        }
        "company" => {
            request.hr_contact = Some("Meera Nair".to_string());
            request.contact_number = Some("+91-9000000000".to_string());
        }
        _ => {
            request.institute_name = Some("Campus Institute of Technology".to_string());
            request.contact_number = Some("+91-8000000000".to_string());
        }
    }
    request
}

/// Register, log in and decode the issued token back into a principal.
fn enrol(
    state: &PlacementState,
    request: RegistrationRequest,
    now: DateTime<Utc>,
) -> Result<Principal, AppError> {
    let email = request.email.clone().unwrap_or_default();
    state.identity.register(request, now)?;
    let login = state.identity.login(
        LoginRequest {
            email,
            password: DEMO_PASSWORD.to_string(),
        },
        now,
    )?;
    Ok(state.identity.authenticate(&login.token, now)?)
}

fn posting(title: &str, online_test: Option<DateTime<Utc>>, now: DateTime<Utc>) -> JobDraft {
    JobDraft {
        title: Some(title.to_string()),
        description: Some(format!("{title} for the campus hiring drive")),
        location: Some("Bengaluru".to_string()),
        package: Some(14.5),
        eligibility_criteria: vec!["CGPA 7.0+".to_string()],
        deadline: Some(now + Duration::days(21)),
        timeline: JobTimeline {
            online_test,
            ..JobTimeline::default()
        },
        ..JobDraft::default()
    }
}

struct Campus {
    state: PlacementState,
    tpo: Principal,
    company: Principal,
    students: Vec<(String, Principal)>,
}

fn seed_campus(now: DateTime<Utc>) -> Result<Campus, AppError> {
    let state = placement_state(&demo_auth())?;
    let tpo = enrol(
        &state,
        registration("tpo", "Placement Officer", "tpo@campus.demo"),
        now,
    )?;
    let company = enrol(
        &state,
        registration("company", "Acme Systems", "hr@acme.demo"),
        now,
    )?;
    let mut students = Vec::new();
    for (name, email) in [
        ("Asha Rao", "asha@campus.demo"),
        ("Bilal Khan", "bilal@campus.demo"),
        ("Chen Li", "chen@campus.demo"),
    ] {
        let principal = enrol(&state, registration("student", name, email), now)?;
        students.push((name.to_string(), principal));
    }
    Ok(Campus {
        state,
        tpo,
        company,
        students,
    })
}

fn print_job(job: &Job) {
    println!(
        "  - {} [{}] approval={} status={}",
        job.title,
        job.id,
        job.approval_status.label(),
        job.status.label()
    );
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let now = Utc::now();
    let campus = seed_campus(now)?;
    let state = &campus.state;
    let company_id = campus.company.company()?;
    let tpo_id = campus.tpo.tpo()?;

    println!("Campus Placement Demo");
    println!("=====================");
    println!(
        "Registered 1 TPO, 1 company and {} students",
        campus.students.len()
    );

    let job = state
        .jobs
        .create_job(company_id, posting("Platform Engineer", None, now), now)?;
    println!("\nJob posted (awaiting TPO review):");
    print_job(&job);

    let job = state.jobs.approve(tpo_id, &job.id, now)?;
    println!("Job approved:");
    print_job(&job);

    let (student_name, student) = &campus.students[0];
    let student_id = student.student()?;
    let application = state.applications.apply(student_id, &job.id, now)?;
    println!(
        "\n{student_name} applied: application {} at {} ({}%)",
        application.application_number(),
        application.stage().label(),
        application.stage_progress()
    );

    let interview = StageChangeRequest {
        stage: "Interview".to_string(),
        details: StageDetails {
            date: Some(now + Duration::days(3)),
            location: Some("Block C, Room 204".to_string()),
            mode: Some(InterviewMode::Offline),
            interviewer: Some("R. Iyer".to_string()),
            ..StageDetails::default()
        },
        message: None,
    };
    let offer = StageChangeRequest {
        stage: "Offer".to_string(),
        details: StageDetails {
            package: Some(PackageBreakdown {
                fixed: 12.0,
                variable: 2.5,
                total: 14.5,
            }),
            joining_date: Some(now + Duration::days(60)),
            ..StageDetails::default()
        },
        message: None,
    };
    let placed = StageChangeRequest {
        stage: "Placed".to_string(),
        details: StageDetails {
            joining_date: Some(now + Duration::days(60)),
            company_location: Some("Bengaluru".to_string()),
            ..StageDetails::default()
        },
        message: None,
    };

    println!("\nStage changes:");
    for (actor, request) in [
        (&campus.company, interview),
        (&campus.tpo, offer),
        (&campus.company, placed),
    ] {
        let transition = state
            .applications
            .advance(actor, &application.id, request, now)?;
        println!(
            "  {} -> {} ({}%) by {:?}, notified={}",
            transition.previous_stage.label(),
            transition.new_stage.label(),
            transition.stage_progress,
            actor.role(),
            transition.notification_delivered
        );
    }

    let updates = state
        .notifications
        .daily_updates(student_id, DailyUpdatesQuery::default(), now)?;
    println!(
        "\nNotifications for {student_name} ({} unread):",
        updates.unread_count
    );
    for notification in &updates.notifications {
        println!(
            "  [{:?}] {}: {}",
            notification.priority, notification.title, notification.message
        );
    }

    let statistics = state.applications.placement_timeline(student_id, now)?;
    println!(
        "Placement statistics: total={} active={} placed={} rate={}%",
        statistics.statistics.total_applications,
        statistics.statistics.active_applications,
        statistics.statistics.placed_applications,
        statistics.statistics.placement_rate
    );

    if !args.skip_assessment {
        run_assessment(&campus, &args, now)?;
    }

    Ok(())
}

fn run_assessment(campus: &Campus, args: &DemoArgs, now: DateTime<Utc>) -> Result<(), AppError> {
    let state = &campus.state;
    let tpo_id = campus.tpo.tpo()?;
    let set = state.assessments.create_set(
        tpo_id,
        QuestionSetDraft {
            title: Some("Aptitude Warm-up".to_string()),
            description: Some("Quantitative and verbal basics".to_string()),
            maximum_marks: Some(30),
            marks_per_question: Some(10),
            total_questions: Some(3),
            time_limit_minutes: Some(15),
        },
        now,
    )?;
    for (text, correct, category) in [
        ("12 x 12 = ?", "B", "Quantitative"),
        ("Synonym of 'rapid'", "A", "Verbal"),
        ("Next prime after 13", "C", "Quantitative"),
    ] {
        state.assessments.add_question(
            tpo_id,
            QuestionDraft {
                question_text: Some(text.to_string()),
                options: Some(AnswerOptions {
                    a: "fast".to_string(),
                    b: "144".to_string(),
                    c: "17".to_string(),
                    d: "none".to_string(),
                }),
                correct_answer: Some(correct.to_string()),
                marks: Some(10),
                difficulty: Some(Difficulty::Easy),
                category: Some(category.to_string()),
                question_set_id: Some(set.id.clone()),
                ..QuestionDraft::default()
            },
            now,
        )?;
    }
    println!("\nQuiz \"{}\" published with 3 questions", set.title);

    // each student gets one more answer wrong than the previous one
    let answer_sheets = [["B", "A", "C"], ["B", "A", "D"], ["D", "A", "D"]];
    for ((name, student), sheet) in campus.students.iter().zip(answer_sheets) {
        let student_id = student.student()?;
        let started = state.assessments.start_test(student_id, &set.id, now)?;
        for (question, answer) in started.questions.iter().zip(sheet) {
            state.assessments.submit_answer(
                student_id,
                &started.test_session,
                &question.id,
                AnswerRequest {
                    selected_answer: answer.to_string(),
                },
                now,
            )?;
        }
        let report = state.assessments.submit_test(
            student_id,
            &started.test_session,
            now + Duration::minutes(9),
        )?;
        println!(
            "  {name}: {}/{} ({}%, {:?})",
            report.statistics.total_score,
            report.statistics.total_possible,
            report.statistics.percentage,
            report.statistics.tier
        );
    }

    let viewer = campus.students[2].1.student()?;
    let leaderboard = state.ranking.leaderboard(Some(viewer), now)?;
    if args.json {
        let rendered =
            serde_json::to_string_pretty(&leaderboard).map_err(std::io::Error::from)?;
        println!("{rendered}");
        return Ok(());
    }

    println!("\nLeaderboard ({} students):", leaderboard.total_students);
    for entry in &leaderboard.leaderboard {
        let marker = if entry.is_current_user { " (you)" } else { "" };
        println!(
            "  #{} {}{} score={} badges={:?}",
            entry.rank, entry.student_name, marker, entry.score, entry.badges
        );
    }
    Ok(())
}

/// Seed one job whose online test is over and one still open, then sweep.
pub(crate) fn run_sweep(args: SweepArgs) -> Result<(), AppError> {
    let now = Utc::now();
    let campus = seed_campus(now)?;
    let state = &campus.state;
    let company_id = campus.company.company()?;
    let tpo_id = campus.tpo.tpo()?;

    let overdue = now - Duration::hours(args.hours_overdue.max(1));
    for (title, online_test) in [
        ("Data Analyst", Some(overdue)),
        ("Site Reliability Engineer", Some(now + Duration::days(5))),
    ] {
        let job = state
            .jobs
            .create_job(company_id, posting(title, online_test, now), now)?;
        state.jobs.approve(tpo_id, &job.id, now)?;
    }

    let report = run_maintenance(state, now)?;
    println!("Auto-close sweep");
    println!("================");
    if report.closed_jobs.is_empty() {
        println!("No jobs were due for closing.");
    } else {
        println!("Closed {} job(s):", report.closed_jobs.len());
        for job in &report.closed_jobs {
            print_job(job);
        }
    }
    println!(
        "Notifications delivered from outbox: {} (pending {})",
        report.notifications_delivered, report.notifications_pending
    );
    Ok(())
}
