use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::user::UserSummary;

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Low priority.
    Low,
    /// Medium priority. The default for newly created tasks.
    Medium,
    /// High priority.
    High,
    /// Urgent priority.
    Urgent,
}

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum; serialized with hyphens
/// (`in-progress`) to match the wire format.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Task is yet to be started. The status of every newly created task.
    Pending,
    /// Task is currently being worked on.
    InProgress,
    /// Task is completed.
    Completed,
}

/// Represents a task entity as stored in the database.
///
/// `assigned_to` and `created_by` hold raw user ids; API responses expand
/// them into [`UserSummary`] objects via [`TaskView`].
#[derive(Debug, Clone, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    /// User responsible for completing the task.
    pub assigned_to: i32,
    /// User who originated the task. Immutable after creation.
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input structure for creating a task.
///
/// Status is not accepted on creation: every new task starts as `pending`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    /// The title of the task. Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// An optional description, at most 1000 characters.
    #[validate(length(max = 1000))]
    pub description: Option<String>,

    /// When the task is due.
    pub due_date: DateTime<Utc>,

    /// The priority of the task. Defaults to medium when omitted.
    pub priority: Option<TaskPriority>,

    /// The user to assign the task to. Defaults to the creator when omitted.
    pub assigned_to: Option<i32>,
}

/// Input structure for a partial task update. Only supplied fields are
/// overwritten.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    /// An empty string is a meaningful value here: it clears the text while
    /// an absent field leaves the stored description untouched.
    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub due_date: Option<DateTime<Utc>>,

    pub priority: Option<TaskPriority>,

    pub status: Option<TaskStatus>,

    /// Reassignment target. Honored only for admin callers; silently
    /// dropped otherwise.
    pub assigned_to: Option<i32>,
}

impl Task {
    /// Creates a new `Task` from `TaskInput` and the creator's user id.
    ///
    /// Applies the creation defaults: status `pending`, priority `medium`,
    /// assignee falling back to the creator.
    pub fn new(input: TaskInput, created_by: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            priority: input.priority.unwrap_or(TaskPriority::Medium),
            status: TaskStatus::Pending,
            due_date: input.due_date,
            assigned_to: input.assigned_to.unwrap_or(created_by),
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges a partial update into the task, bumping `updated_at`.
    ///
    /// Reassignment is applied only when `allow_reassign` is set; a
    /// non-admin supplying `assignedTo` keeps the original assignee.
    pub fn apply_update(&mut self, update: TaskUpdate, allow_reassign: bool) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(due_date) = update.due_date {
            self.due_date = due_date;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(assigned_to) = update.assigned_to {
            if allow_reassign {
                self.assigned_to = assigned_to;
            }
        }
        self.updated_at = Utc::now();
    }

    /// Whether the task is overdue at `now`: due date strictly in the past
    /// and not completed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_date < now && self.status != TaskStatus::Completed
    }
}

/// A task as returned by the API, with assignee and creator expanded to
/// embedded summaries. A dangling reference serializes as `null`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    pub assigned_to: Option<UserSummary>,
    pub created_by: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flat row produced by the task/user join queries, folded into [`TaskView`].
#[derive(Debug, FromRow)]
pub struct TaskViewRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub assignee_id: Option<i32>,
    pub assignee_username: Option<String>,
    pub assignee_email: Option<String>,
    pub creator_id: Option<i32>,
    pub creator_username: Option<String>,
    pub creator_email: Option<String>,
}

fn summary(id: Option<i32>, username: Option<String>, email: Option<String>) -> Option<UserSummary> {
    Some(UserSummary {
        id: id?,
        username: username?,
        email: email?,
    })
}

impl From<TaskViewRow> for TaskView {
    fn from(row: TaskViewRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            priority: row.priority,
            status: row.status,
            due_date: row.due_date,
            assigned_to: summary(row.assignee_id, row.assignee_username, row.assignee_email),
            created_by: summary(row.creator_id, row.creator_username, row.creator_email),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Per-priority slice of the statistics aggregate.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriorityBreakdown {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub urgent: usize,
}

/// Aggregate statistics over a set of tasks, computed by scanning the
/// caller's visible set at request time. Nothing is persisted or cached.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub overdue: usize,
    pub by_priority: PriorityBreakdown,
}

impl TaskStats {
    /// Computes the aggregate over `tasks` as of `now`.
    pub fn compute(tasks: &[Task], now: DateTime<Utc>) -> Self {
        let count_status = |s: TaskStatus| tasks.iter().filter(|t| t.status == s).count();
        let count_priority = |p: TaskPriority| tasks.iter().filter(|t| t.priority == p).count();
        Self {
            total: tasks.len(),
            pending: count_status(TaskStatus::Pending),
            in_progress: count_status(TaskStatus::InProgress),
            completed: count_status(TaskStatus::Completed),
            overdue: tasks.iter().filter(|t| t.is_overdue(now)).count(),
            by_priority: PriorityBreakdown {
                low: count_priority(TaskPriority::Low),
                medium: count_priority(TaskPriority::Medium),
                high: count_priority(TaskPriority::High),
                urgent: count_priority(TaskPriority::Urgent),
            },
        }
    }
}
