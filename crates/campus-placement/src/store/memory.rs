use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::workflows::applications::{Application, ApplicationRepository};
use crate::workflows::assessments::{
    Question, QuestionBank, QuestionSet, TestSession, TestSessionRepository,
};
use crate::workflows::error::RepositoryError;
use crate::workflows::identity::{
    CompanyProfile, ProfileDirectory, StudentProfile, TpoProfile, UserAccount, UserRepository,
};
use crate::workflows::ids::{
    ApplicationId, CompanyId, JobId, NotificationId, QuestionId, QuestionSetId, StudentId,
    TestSessionId, TpoId, UserId,
};
use crate::workflows::jobs::{Job, JobRepository};
use crate::workflows::notifications::{Notification, NotificationRepository};
use crate::workflows::ranking::{RankingRecord, RankingRepository};

/// Process-local store backing every repository trait.
///
/// Collections that are listed keep insertion order.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<UserAccount>>,
    students: Mutex<Vec<StudentProfile>>,
    companies: Mutex<HashMap<CompanyId, CompanyProfile>>,
    tpos: Mutex<HashMap<TpoId, TpoProfile>>,
    jobs: Mutex<Vec<Job>>,
    applications: Mutex<Vec<Application>>,
    notifications: Mutex<Vec<Notification>>,
    rankings: Mutex<HashMap<StudentId, RankingRecord>>,
    question_sets: Mutex<Vec<QuestionSet>>,
    questions: Mutex<HashMap<QuestionId, Question>>,
    sessions: Mutex<Vec<TestSession>>,
}

fn guard<'a, T>(
    collection: &'a Mutex<T>,
    name: &str,
) -> Result<MutexGuard<'a, T>, RepositoryError> {
    collection
        .lock()
        .map_err(|_| RepositoryError::Unavailable(format!("{name} collection poisoned")))
}

fn replace<T>(
    records: &mut [T],
    record: T,
    matches: impl Fn(&T) -> bool,
) -> Result<(), RepositoryError> {
    let slot = records
        .iter_mut()
        .find(|candidate| matches(candidate))
        .ok_or(RepositoryError::NotFound)?;
    *slot = record;
    Ok(())
}

impl UserRepository for MemoryStore {
    fn insert(&self, account: UserAccount) -> Result<UserAccount, RepositoryError> {
        let mut users = guard(&self.users, "users")?;
        if users
            .iter()
            .any(|user| user.id == account.id || user.email.eq_ignore_ascii_case(&account.email))
        {
            return Err(RepositoryError::Conflict);
        }
        users.push(account.clone());
        Ok(account)
    }

    fn fetch(&self, id: &UserId) -> Result<Option<UserAccount>, RepositoryError> {
        let users = guard(&self.users, "users")?;
        Ok(users.iter().find(|user| &user.id == id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, RepositoryError> {
        let users = guard(&self.users, "users")?;
        Ok(users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

impl ProfileDirectory for MemoryStore {
    fn insert_student(&self, profile: StudentProfile) -> Result<StudentProfile, RepositoryError> {
        let mut students = guard(&self.students, "students")?;
        if students.iter().any(|student| student.id == profile.id) {
            return Err(RepositoryError::Conflict);
        }
        students.push(profile.clone());
        Ok(profile)
    }

    fn student(&self, id: &StudentId) -> Result<Option<StudentProfile>, RepositoryError> {
        let students = guard(&self.students, "students")?;
        Ok(students.iter().find(|student| &student.id == id).cloned())
    }

    fn students(&self) -> Result<Vec<StudentProfile>, RepositoryError> {
        Ok(guard(&self.students, "students")?.clone())
    }

    fn insert_company(&self, profile: CompanyProfile) -> Result<CompanyProfile, RepositoryError> {
        let mut companies = guard(&self.companies, "companies")?;
        if companies.contains_key(&profile.id) {
            return Err(RepositoryError::Conflict);
        }
        companies.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    fn company(&self, id: &CompanyId) -> Result<Option<CompanyProfile>, RepositoryError> {
        Ok(guard(&self.companies, "companies")?.get(id).cloned())
    }

    fn insert_tpo(&self, profile: TpoProfile) -> Result<TpoProfile, RepositoryError> {
        let mut tpos = guard(&self.tpos, "tpos")?;
        if tpos.contains_key(&profile.id) {
            return Err(RepositoryError::Conflict);
        }
        tpos.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    fn tpo(&self, id: &TpoId) -> Result<Option<TpoProfile>, RepositoryError> {
        Ok(guard(&self.tpos, "tpos")?.get(id).cloned())
    }
}

impl JobRepository for MemoryStore {
    fn insert(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut jobs = guard(&self.jobs, "jobs")?;
        if jobs.iter().any(|existing| existing.id == job.id) {
            return Err(RepositoryError::Conflict);
        }
        jobs.push(job.clone());
        Ok(job)
    }

    fn update(&self, job: Job) -> Result<(), RepositoryError> {
        let mut jobs = guard(&self.jobs, "jobs")?;
        let id = job.id.clone();
        replace(&mut jobs, job, |existing| existing.id == id)
    }

    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let jobs = guard(&self.jobs, "jobs")?;
        Ok(jobs.iter().find(|job| &job.id == id).cloned())
    }

    fn list(&self) -> Result<Vec<Job>, RepositoryError> {
        Ok(guard(&self.jobs, "jobs")?.clone())
    }

    fn remove(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let mut jobs = guard(&self.jobs, "jobs")?;
        let position = jobs.iter().position(|job| &job.id == id);
        Ok(position.map(|index| jobs.remove(index)))
    }
}

impl ApplicationRepository for MemoryStore {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut applications = guard(&self.applications, "applications")?;
        let duplicate = applications.iter().any(|existing| {
            existing.id == application.id
                || (existing.student == application.student && existing.job == application.job)
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        applications.push(application.clone());
        Ok(application)
    }

    fn update(&self, application: Application) -> Result<(), RepositoryError> {
        let mut applications = guard(&self.applications, "applications")?;
        let id = application.id.clone();
        replace(&mut applications, application, |existing| existing.id == id)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let applications = guard(&self.applications, "applications")?;
        Ok(applications
            .iter()
            .find(|application| &application.id == id)
            .cloned())
    }

    fn find(
        &self,
        student: &StudentId,
        job: &JobId,
    ) -> Result<Option<Application>, RepositoryError> {
        let applications = guard(&self.applications, "applications")?;
        Ok(applications
            .iter()
            .find(|application| &application.student == student && &application.job == job)
            .cloned())
    }

    fn for_student(&self, student: &StudentId) -> Result<Vec<Application>, RepositoryError> {
        let applications = guard(&self.applications, "applications")?;
        Ok(applications
            .iter()
            .filter(|application| &application.student == student)
            .cloned()
            .collect())
    }

    fn for_job(&self, job: &JobId) -> Result<Vec<Application>, RepositoryError> {
        let applications = guard(&self.applications, "applications")?;
        Ok(applications
            .iter()
            .filter(|application| &application.job == job)
            .cloned()
            .collect())
    }
}

impl NotificationRepository for MemoryStore {
    fn insert(&self, notification: Notification) -> Result<Notification, RepositoryError> {
        let mut notifications = guard(&self.notifications, "notifications")?;
        if notifications
            .iter()
            .any(|existing| existing.id == notification.id)
        {
            return Err(RepositoryError::Conflict);
        }
        notifications.push(notification.clone());
        Ok(notification)
    }

    fn update(&self, notification: Notification) -> Result<(), RepositoryError> {
        let mut notifications = guard(&self.notifications, "notifications")?;
        let id = notification.id.clone();
        replace(&mut notifications, notification, |existing| existing.id == id)
    }

    fn fetch(&self, id: &NotificationId) -> Result<Option<Notification>, RepositoryError> {
        let notifications = guard(&self.notifications, "notifications")?;
        Ok(notifications
            .iter()
            .find(|notification| &notification.id == id)
            .cloned())
    }

    fn for_student(&self, student: &StudentId) -> Result<Vec<Notification>, RepositoryError> {
        let notifications = guard(&self.notifications, "notifications")?;
        Ok(notifications
            .iter()
            .filter(|notification| &notification.student == student)
            .cloned()
            .collect())
    }
}

impl RankingRepository for MemoryStore {
    fn fetch(&self, student: &StudentId) -> Result<Option<RankingRecord>, RepositoryError> {
        Ok(guard(&self.rankings, "rankings")?.get(student).cloned())
    }

    fn upsert(&self, record: RankingRecord) -> Result<(), RepositoryError> {
        guard(&self.rankings, "rankings")?.insert(record.student.clone(), record);
        Ok(())
    }

    fn list(&self) -> Result<Vec<RankingRecord>, RepositoryError> {
        Ok(guard(&self.rankings, "rankings")?.values().cloned().collect())
    }
}

impl QuestionBank for MemoryStore {
    fn insert_set(&self, set: QuestionSet) -> Result<QuestionSet, RepositoryError> {
        let mut sets = guard(&self.question_sets, "question sets")?;
        if sets.iter().any(|existing| existing.id == set.id) {
            return Err(RepositoryError::Conflict);
        }
        sets.push(set.clone());
        Ok(set)
    }

    fn update_set(&self, set: QuestionSet) -> Result<(), RepositoryError> {
        let mut sets = guard(&self.question_sets, "question sets")?;
        let id = set.id.clone();
        replace(&mut sets, set, |existing| existing.id == id)
    }

    fn fetch_set(&self, id: &QuestionSetId) -> Result<Option<QuestionSet>, RepositoryError> {
        let sets = guard(&self.question_sets, "question sets")?;
        Ok(sets.iter().find(|set| &set.id == id).cloned())
    }

    fn list_sets(&self) -> Result<Vec<QuestionSet>, RepositoryError> {
        Ok(guard(&self.question_sets, "question sets")?.clone())
    }

    fn insert_question(&self, question: Question) -> Result<Question, RepositoryError> {
        let mut questions = guard(&self.questions, "questions")?;
        if questions.contains_key(&question.id) {
            return Err(RepositoryError::Conflict);
        }
        questions.insert(question.id.clone(), question.clone());
        Ok(question)
    }

    fn fetch_question(&self, id: &QuestionId) -> Result<Option<Question>, RepositoryError> {
        Ok(guard(&self.questions, "questions")?.get(id).cloned())
    }
}

impl TestSessionRepository for MemoryStore {
    fn insert_session(&self, session: TestSession) -> Result<TestSession, RepositoryError> {
        let mut sessions = guard(&self.sessions, "test sessions")?;
        if sessions.iter().any(|existing| existing.id == session.id) {
            return Err(RepositoryError::Conflict);
        }
        sessions.push(session.clone());
        Ok(session)
    }

    fn update_session(&self, session: TestSession) -> Result<(), RepositoryError> {
        let mut sessions = guard(&self.sessions, "test sessions")?;
        let id = session.id.clone();
        replace(&mut sessions, session, |existing| existing.id == id)
    }

    fn fetch_session(&self, id: &TestSessionId) -> Result<Option<TestSession>, RepositoryError> {
        let sessions = guard(&self.sessions, "test sessions")?;
        Ok(sessions.iter().find(|session| &session.id == id).cloned())
    }

    fn sessions_for(&self, student: &StudentId) -> Result<Vec<TestSession>, RepositoryError> {
        let sessions = guard(&self.sessions, "test sessions")?;
        Ok(sessions
            .iter()
            .filter(|session| &session.student == student)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::identity::ProfileRef;
    use chrono::{TimeZone, Utc};

    fn account(email: &str) -> UserAccount {
        UserAccount {
            id: UserId::generate(),
            name: "Asha".to_string(),
            email: email.to_string(),
            password_hash: "digest".to_string(),
            profile: ProfileRef::Student(StudentId::generate()),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("valid"),
        }
    }

    #[test]
    fn emails_are_unique_ignoring_case() {
        let store = MemoryStore::default();
        UserRepository::insert(&store, account("asha@campus.test")).expect("first");
        let duplicate = UserRepository::insert(&store, account("Asha@Campus.test"));
        assert!(matches!(duplicate, Err(RepositoryError::Conflict)));
        assert!(store
            .find_by_email("ASHA@campus.test")
            .expect("lookup")
            .is_some());
    }

    #[test]
    fn updates_of_missing_records_are_not_found() {
        let store = MemoryStore::default();
        let session = TestSession {
            id: TestSessionId::from("tst-missing"),
            student: StudentId::from("stu-1"),
            question_set: QuestionSetId::from("qset-1"),
            answers: Vec::new(),
            total_marks_obtained: 0,
            total_marks_possible: 10,
            percentage: 0.0,
            start_time: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("valid"),
            end_time: None,
            duration_minutes: None,
            is_completed: false,
        };
        assert!(matches!(
            store.update_session(session),
            Err(RepositoryError::NotFound)
        ));
    }
}
