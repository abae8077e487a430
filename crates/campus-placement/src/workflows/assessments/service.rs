use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::workflows::error::PlacementError;
use crate::workflows::ids::{QuestionId, QuestionSetId, StudentId, TestSessionId, TpoId};
use crate::workflows::ranking::{QuizCompletion, RankingService};

use super::domain::{
    AnswerOutcome, Choice, Question, QuestionDraft, QuestionSet, QuestionSetDraft, QuestionView,
    TestSession,
};
use super::repository::{QuestionBank, TestSessionRepository};
use super::results::{build_report, ResultSummary, TestReport};

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerRequest {
    pub selected_answer: String,
}

/// Question set header shown when a test starts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetOverview {
    pub id: QuestionSetId,
    pub title: String,
    pub description: String,
    pub time_limit_minutes: u32,
    pub total_questions: u32,
    pub maximum_marks: u32,
}

impl From<&QuestionSet> for SetOverview {
    fn from(set: &QuestionSet) -> Self {
        Self {
            id: set.id.clone(),
            title: set.title.clone(),
            description: set.description.clone(),
            time_limit_minutes: set.time_limit_minutes,
            total_questions: set.total_questions,
            maximum_marks: set.maximum_marks,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StartedTest {
    pub test_session: TestSessionId,
    pub question_set: SetOverview,
    pub questions: Vec<QuestionView>,
    pub start_time: DateTime<Utc>,
}

/// A question set with its questions; correct answers only for TPO callers.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionSetDetails {
    #[serde(flatten)]
    pub set: QuestionSet,
    pub question_views: Vec<QuestionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_key: Option<Vec<Question>>,
}

/// Question bank administration and the student test flow.
pub struct AssessmentService {
    bank: Arc<dyn QuestionBank>,
    sessions: Arc<dyn TestSessionRepository>,
    ranking: Arc<RankingService>,
}

impl AssessmentService {
    pub fn new(
        bank: Arc<dyn QuestionBank>,
        sessions: Arc<dyn TestSessionRepository>,
        ranking: Arc<RankingService>,
    ) -> Self {
        Self {
            bank,
            sessions,
            ranking,
        }
    }

    fn set(&self, id: &QuestionSetId) -> Result<QuestionSet, PlacementError> {
        self.bank
            .fetch_set(id)?
            .ok_or(PlacementError::NotFound("question set"))
    }

    fn questions_of(&self, set: &QuestionSet) -> Result<Vec<Question>, PlacementError> {
        let mut questions = Vec::with_capacity(set.questions.len());
        for id in &set.questions {
            if let Some(question) = self.bank.fetch_question(id)? {
                questions.push(question);
            }
        }
        Ok(questions)
    }

    fn owned_session(
        &self,
        student: &StudentId,
        id: &TestSessionId,
    ) -> Result<TestSession, PlacementError> {
        self.sessions
            .fetch_session(id)?
            .filter(|session| &session.student == student)
            .ok_or(PlacementError::NotFound("test session"))
    }

    pub fn create_set(
        &self,
        creator: &TpoId,
        draft: QuestionSetDraft,
        now: DateTime<Utc>,
    ) -> Result<QuestionSet, PlacementError> {
        let set = QuestionSet::from_draft(creator.clone(), draft, now)?;
        let stored = self.bank.insert_set(set)?;
        info!(question_set_id = %stored.id, tpo_id = %creator, "question set created");
        Ok(stored)
    }

    /// Create a question, attaching it to its question set when one is named.
    pub fn add_question(
        &self,
        creator: &TpoId,
        draft: QuestionDraft,
        now: DateTime<Utc>,
    ) -> Result<Question, PlacementError> {
        let question = Question::from_draft(creator.clone(), draft, now)?;
        let parent = match &question.question_set {
            Some(set_id) => Some(self.set(set_id)?),
            None => None,
        };
        let stored = self.bank.insert_question(question)?;
        if let Some(mut set) = parent {
            set.questions.push(stored.id.clone());
            set.updated_at = now;
            self.bank.update_set(set)?;
        }
        info!(question_id = %stored.id, "question created");
        Ok(stored)
    }

    pub fn active_sets(&self) -> Result<Vec<QuestionSet>, PlacementError> {
        let mut sets: Vec<QuestionSet> = self
            .bank
            .list_sets()?
            .into_iter()
            .filter(|set| set.is_active)
            .collect();
        sets.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(sets)
    }

    pub fn question_set(
        &self,
        id: &QuestionSetId,
        reveal_answers: bool,
    ) -> Result<QuestionSetDetails, PlacementError> {
        let set = self.set(id)?;
        let questions = self.questions_of(&set)?;
        Ok(QuestionSetDetails {
            question_views: questions.iter().map(QuestionView::from).collect(),
            answer_key: reveal_answers.then_some(questions),
            set,
        })
    }

    /// Soft delete: the set stays readable but can no longer be started.
    pub fn deactivate_set(
        &self,
        id: &QuestionSetId,
        now: DateTime<Utc>,
    ) -> Result<QuestionSet, PlacementError> {
        let mut set = self.set(id)?;
        set.is_active = false;
        set.updated_at = now;
        self.bank.update_set(set.clone())?;
        info!(question_set_id = %set.id, "question set deactivated");
        Ok(set)
    }

    pub fn start_test(
        &self,
        student: &StudentId,
        set_id: &QuestionSetId,
        now: DateTime<Utc>,
    ) -> Result<StartedTest, PlacementError> {
        let set = self
            .bank
            .fetch_set(set_id)?
            .filter(|set| set.is_active)
            .ok_or(PlacementError::NotFound("question set"))?;
        let unfinished = self
            .sessions
            .sessions_for(student)?
            .into_iter()
            .any(|session| &session.question_set == set_id && !session.is_completed);
        if unfinished {
            return Err(PlacementError::conflict("you have already started this test"));
        }

        let session = self
            .sessions
            .insert_session(TestSession::start(student.clone(), &set, now))?;
        let questions = self.questions_of(&set)?;
        info!(test_session_id = %session.id, student_id = %student, "test started");
        Ok(StartedTest {
            test_session: session.id,
            question_set: SetOverview::from(&set),
            questions: questions.iter().map(QuestionView::from).collect(),
            start_time: session.start_time,
        })
    }

    pub fn submit_answer(
        &self,
        student: &StudentId,
        session_id: &TestSessionId,
        question_id: &QuestionId,
        request: AnswerRequest,
        now: DateTime<Utc>,
    ) -> Result<AnswerOutcome, PlacementError> {
        let choice = Choice::parse(&request.selected_answer)
            .ok_or_else(|| PlacementError::validation("invalid answer format"))?;
        let mut session = self.owned_session(student, session_id)?;
        if session.is_completed {
            return Err(PlacementError::NotFound("test session"));
        }
        let question = self
            .bank
            .fetch_question(question_id)?
            .ok_or(PlacementError::NotFound("question"))?;
        let outcome = session.answer(&question, choice, now)?;
        self.sessions.update_session(session)?;
        Ok(outcome)
    }

    fn report(&self, session: &TestSession) -> Result<TestReport, PlacementError> {
        let set = self.set(&session.question_set)?;
        let mut questions = HashMap::with_capacity(session.answers.len());
        for answer in &session.answers {
            if let Some(question) = self.bank.fetch_question(&answer.question)? {
                questions.insert(question.id.clone(), question);
            }
        }
        Ok(build_report(session, &set, &questions))
    }

    /// Close the session and feed the score into the ranking engine.
    pub fn submit_test(
        &self,
        student: &StudentId,
        session_id: &TestSessionId,
        now: DateTime<Utc>,
    ) -> Result<TestReport, PlacementError> {
        let mut session = self.owned_session(student, session_id)?;
        session.submit(now)?;
        self.sessions.update_session(session.clone())?;
        info!(
            test_session_id = %session.id,
            student_id = %student,
            marks = session.total_marks_obtained,
            "test submitted"
        );

        let completion = QuizCompletion {
            student_id: student.clone(),
            quiz_id: session.question_set.clone(),
            score: f64::from(session.total_marks_obtained),
            percentage: session.percentage.min(100.0),
        };
        if let Err(error) = self.ranking.record_quiz_completion(completion, now) {
            warn!(
                %error,
                test_session_id = %session.id,
                "ranking update failed after test submission"
            );
        }

        self.report(&session)
    }

    pub fn result(
        &self,
        student: &StudentId,
        session_id: &TestSessionId,
    ) -> Result<TestReport, PlacementError> {
        let session = self
            .owned_session(student, session_id)
            .ok()
            .filter(|session| session.is_completed)
            .ok_or(PlacementError::NotFound("test result"))?;
        self.report(&session)
    }

    /// Completed sessions of one student, newest first.
    pub fn results(&self, student: &StudentId) -> Result<Vec<ResultSummary>, PlacementError> {
        let mut completed: Vec<TestSession> = self
            .sessions
            .sessions_for(student)?
            .into_iter()
            .filter(|session| session.is_completed)
            .collect();
        completed.sort_by(|left, right| right.end_time.cmp(&left.end_time));

        let mut summaries = Vec::with_capacity(completed.len());
        for session in completed {
            let title = self.bank.fetch_set(&session.question_set)?.map(|set| set.title);
            summaries.push(ResultSummary {
                session_id: session.id,
                question_set_id: session.question_set,
                title,
                total_marks_obtained: session.total_marks_obtained,
                total_marks_possible: session.total_marks_possible,
                percentage: session.percentage,
                end_time: session.end_time,
                duration_minutes: session.duration_minutes,
            });
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::workflows::assessments::domain::AnswerOptions;
    use crate::workflows::identity::{ProfileDirectory, StudentProfile};
    use crate::workflows::ranking::RankingRepository;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 6, 10, 0, 0).single().expect("valid")
    }

    struct Fixture {
        service: AssessmentService,
        store: Arc<MemoryStore>,
        student: StudentId,
        tpo: TpoId,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::default());
        let ranking = Arc::new(RankingService::new(store.clone(), store.clone()));
        let service = AssessmentService::new(store.clone(), store.clone(), ranking);
        let student = store
            .insert_student(StudentProfile {
                id: StudentId::from("stu-1"),
                name: "Asha".to_string(),
                email: "asha@campus.test".to_string(),
                roll_number: "CS01".to_string(),
                branch: "CSE".to_string(),
                graduation_year: 2026,
                phone: None,
                cgpa: None,
                skills: Vec::new(),
                created_at: now(),
            })
            .expect("student")
            .id;
        Fixture {
            service,
            store,
            student,
            tpo: TpoId::from("tpo-1"),
        }
    }

    fn seed_set(fixture: &Fixture) -> (QuestionSet, Vec<Question>) {
        let set = fixture
            .service
            .create_set(
                &fixture.tpo,
                QuestionSetDraft {
                    title: Some("Aptitude".to_string()),
                    description: Some("Placement warm-up".to_string()),
                    maximum_marks: Some(4),
                    marks_per_question: Some(2),
                    total_questions: Some(2),
                    time_limit_minutes: Some(20),
                },
                now(),
            )
            .expect("set");
        let questions = ["A", "B"]
            .into_iter()
            .map(|correct| {
                fixture
                    .service
                    .add_question(
                        &fixture.tpo,
                        QuestionDraft {
                            question_text: Some(format!("Answer is {correct}")),
                            options: Some(AnswerOptions {
                                a: "a".to_string(),
                                b: "b".to_string(),
                                c: "c".to_string(),
                                d: "d".to_string(),
                            }),
                            correct_answer: Some(correct.to_string()),
                            marks: Some(2),
                            question_set_id: Some(set.id.clone()),
                            ..QuestionDraft::default()
                        },
                        now(),
                    )
                    .expect("question")
            })
            .collect();
        (set, questions)
    }

    #[test]
    fn full_test_flow_feeds_the_ranking() {
        let fixture = fixture();
        let (set, questions) = seed_set(&fixture);

        let started = fixture
            .service
            .start_test(&fixture.student, &set.id, now())
            .expect("start");
        assert_eq!(started.questions.len(), 2);

        let duplicate = fixture.service.start_test(&fixture.student, &set.id, now());
        assert!(matches!(duplicate, Err(PlacementError::StateConflict(_))));

        let outcome = fixture
            .service
            .submit_answer(
                &fixture.student,
                &started.test_session,
                &questions[0].id,
                AnswerRequest {
                    selected_answer: "A".to_string(),
                },
                now() + Duration::minutes(1),
            )
            .expect("answer");
        assert!(outcome.is_correct);

        let invalid = fixture.service.submit_answer(
            &fixture.student,
            &started.test_session,
            &questions[1].id,
            AnswerRequest {
                selected_answer: "Z".to_string(),
            },
            now(),
        );
        assert!(matches!(invalid, Err(PlacementError::Validation(_))));

        let report = fixture
            .service
            .submit_test(&fixture.student, &started.test_session, now() + Duration::minutes(10))
            .expect("submit");
        assert_eq!(report.statistics.total_score, 2);
        assert_eq!(report.statistics.percentage, 50.0);

        let ranking = RankingRepository::fetch(fixture.store.as_ref(), &fixture.student)
            .expect("fetch")
            .expect("ranking record");
        assert_eq!(ranking.total_score, 2.0);
        assert_eq!(ranking.rank, 1);

        let results = fixture.service.results(&fixture.student).expect("results");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title.as_deref(), Some("Aptitude"));

        let restarted = fixture.service.start_test(&fixture.student, &set.id, now());
        assert!(restarted.is_ok());
    }

    #[test]
    fn inactive_sets_cannot_be_started_and_answers_stay_hidden() {
        let fixture = fixture();
        let (set, _) = seed_set(&fixture);

        let student_view = fixture.service.question_set(&set.id, false).expect("view");
        assert!(student_view.answer_key.is_none());
        let json = serde_json::to_value(&student_view).expect("json");
        assert!(json.get("answer_key").is_none());

        fixture.service.deactivate_set(&set.id, now()).expect("deactivate");
        assert!(fixture.service.active_sets().expect("sets").is_empty());
        let started = fixture.service.start_test(&fixture.student, &set.id, now());
        assert!(matches!(started, Err(PlacementError::NotFound("question set"))));
    }

    #[test]
    fn foreign_sessions_are_not_found() {
        let fixture = fixture();
        let (set, _) = seed_set(&fixture);
        let started = fixture
            .service
            .start_test(&fixture.student, &set.id, now())
            .expect("start");
        let stranger = StudentId::from("stu-2");
        let result = fixture
            .service
            .submit_test(&stranger, &started.test_session, now());
        assert!(matches!(result, Err(PlacementError::NotFound("test session"))));
        let pending = fixture.service.result(&fixture.student, &started.test_session);
        assert!(matches!(pending, Err(PlacementError::NotFound("test result"))));
    }
}
