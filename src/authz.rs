//!
//! # Authorization Rules
//!
//! Every role/ownership decision in the application goes through this one
//! module: a pure `check(actor, action)` over the acting identity and the
//! target resource, returning a typed denial reason on refusal. Handlers
//! never compare roles inline; they describe the action and let this module
//! decide. The rules are plain data in, data out, so they are tested here
//! without any HTTP or database machinery.

use crate::error::AppError;
use crate::models::{Role, Task};

/// The acting identity attached to a request by the auth middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: i32,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// An operation an actor is attempting against a resource.
#[derive(Debug)]
pub enum Action<'a> {
    /// Read a single task.
    ViewTask(&'a Task),
    /// Modify a task's fields (other than the assignee).
    UpdateTask(&'a Task),
    /// Change a task's assignee.
    ReassignTask,
    /// Remove a task.
    DeleteTask(&'a Task),
    /// Create a task assigned to the given user.
    CreateTaskFor(i32),
    /// Any user-management operation: listing, role changes, deletion,
    /// per-user task counts.
    ManageUsers,
}

/// Typed reason an action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// The actor is not the task's assignee.
    NotAssignee,
    /// The actor is not the task's creator.
    NotCreator,
    /// Non-admins may only assign new tasks to themselves.
    NotSelfAssignment,
    /// The operation is reserved for administrators.
    AdminOnly,
}

impl Denial {
    pub fn message(&self) -> &'static str {
        match self {
            Denial::NotAssignee | Denial::NotCreator => "Access denied",
            Denial::NotSelfAssignment => "Tasks can only be assigned to yourself",
            Denial::AdminOnly => "Admin access required",
        }
    }
}

impl From<Denial> for AppError {
    fn from(denial: Denial) -> AppError {
        AppError::Forbidden(denial.message().to_string())
    }
}

/// Decides whether `actor` may perform `action`.
///
/// Admins are allowed everything. For the rest, the ownership rules are
/// deliberately asymmetric: viewing and updating belong to the assignee,
/// deletion belongs to the creator.
pub fn check(actor: &Actor, action: Action) -> Result<(), Denial> {
    if actor.is_admin() {
        return Ok(());
    }
    match action {
        Action::ViewTask(task) | Action::UpdateTask(task) => {
            if task.assigned_to == actor.id {
                Ok(())
            } else {
                Err(Denial::NotAssignee)
            }
        }
        Action::DeleteTask(task) => {
            if task.created_by == actor.id {
                Ok(())
            } else {
                Err(Denial::NotCreator)
            }
        }
        Action::CreateTaskFor(assignee) => {
            if assignee == actor.id {
                Ok(())
            } else {
                Err(Denial::NotSelfAssignment)
            }
        }
        Action::ReassignTask | Action::ManageUsers => Err(Denial::AdminOnly),
    }
}

/// Visibility scope for task listing and statistics.
///
/// `None` means the whole table (admins); `Some(id)` restricts the query to
/// tasks assigned to that user.
pub fn task_scope(actor: &Actor) -> Option<i32> {
    if actor.is_admin() {
        None
    } else {
        Some(actor.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskInput, TaskPriority, TaskStatus};
    use chrono::Utc;

    fn actor(id: i32, role: Role) -> Actor {
        Actor { id, role }
    }

    fn task(assigned_to: i32, created_by: i32) -> Task {
        let mut task = Task::new(
            TaskInput {
                title: "Fixture".to_string(),
                description: None,
                due_date: Utc::now(),
                priority: Some(TaskPriority::Medium),
                assigned_to: Some(assigned_to),
            },
            created_by,
        );
        task.status = TaskStatus::Pending;
        task
    }

    #[test]
    fn test_admin_is_allowed_everything() {
        let admin = actor(1, Role::Admin);
        let foreign = task(2, 3);
        assert!(check(&admin, Action::ViewTask(&foreign)).is_ok());
        assert!(check(&admin, Action::UpdateTask(&foreign)).is_ok());
        assert!(check(&admin, Action::DeleteTask(&foreign)).is_ok());
        assert!(check(&admin, Action::ReassignTask).is_ok());
        assert!(check(&admin, Action::CreateTaskFor(99)).is_ok());
        assert!(check(&admin, Action::ManageUsers).is_ok());
    }

    #[test]
    fn test_assignee_may_view_and_update() {
        let user = actor(2, Role::User);
        let mine = task(2, 3);
        assert!(check(&user, Action::ViewTask(&mine)).is_ok());
        assert!(check(&user, Action::UpdateTask(&mine)).is_ok());
    }

    #[test]
    fn test_non_assignee_denied_view_and_update() {
        let user = actor(2, Role::User);
        let theirs = task(5, 2);
        assert_eq!(check(&user, Action::ViewTask(&theirs)), Err(Denial::NotAssignee));
        assert_eq!(check(&user, Action::UpdateTask(&theirs)), Err(Denial::NotAssignee));
    }

    #[test]
    fn test_deletion_belongs_to_creator_not_assignee() {
        let user = actor(2, Role::User);
        // Assigned to the actor but created by someone else: may not delete.
        let assigned_not_created = task(2, 5);
        assert_eq!(
            check(&user, Action::DeleteTask(&assigned_not_created)),
            Err(Denial::NotCreator)
        );
        // Created by the actor but assigned elsewhere: may delete.
        let created_not_assigned = task(5, 2);
        assert!(check(&user, Action::DeleteTask(&created_not_assigned)).is_ok());
    }

    #[test]
    fn test_non_admin_may_only_self_assign_on_create() {
        let user = actor(2, Role::User);
        assert!(check(&user, Action::CreateTaskFor(2)).is_ok());
        assert_eq!(
            check(&user, Action::CreateTaskFor(3)),
            Err(Denial::NotSelfAssignment)
        );
    }

    #[test]
    fn test_reassignment_and_user_management_are_admin_only() {
        let user = actor(2, Role::User);
        assert_eq!(check(&user, Action::ReassignTask), Err(Denial::AdminOnly));
        assert_eq!(check(&user, Action::ManageUsers), Err(Denial::AdminOnly));
    }

    #[test]
    fn test_task_scope() {
        assert_eq!(task_scope(&actor(1, Role::Admin)), None);
        assert_eq!(task_scope(&actor(7, Role::User)), Some(7));
    }

    #[test]
    fn test_denial_converts_to_forbidden() {
        let err: AppError = Denial::AdminOnly.into();
        match err {
            AppError::Forbidden(msg) => assert_eq!(msg, "Admin access required"),
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }
}
