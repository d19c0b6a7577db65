// src/access.rs
//! Role-derived visibility and mutation rules.
//!
//! Everything here is pure: the middleware resolves the session into an
//! [`Actor`] once per request, and the services ask the actor whether an
//! operation is allowed. A user may hold several roles; each role grants its
//! own access and the result is the union.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Teacher, Role::Student];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Teacher => "Teacher",
            Role::Student => "Student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::validation(format!("Unknown role '{}'.", s)))
    }
}

/// The roles held by one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn new() -> Self {
        RoleSet::default()
    }

    /// Builds the set from stored role names. Unknown names are ignored.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = RoleSet::new();
        for name in names {
            match name.as_ref().parse::<Role>() {
                Ok(role) => set.insert(role),
                Err(_) => tracing::warn!("Ignoring unknown stored role '{}'", name.as_ref()),
            }
        }
        set
    }

    pub fn insert(&mut self, role: Role) {
        self.0.insert(role);
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn contains_any(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.contains(*r))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    pub fn names(&self) -> Vec<String> {
        self.iter().map(|r| r.as_str().to_string()).collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
        RoleSet(iter.into_iter().collect())
    }
}

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: String,
    pub roles: RoleSet,
    /// Student profile owned by this user, if any.
    pub student_id: Option<i64>,
    /// Teacher profile owned by this user, if any.
    pub teacher_id: Option<i64>,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(Role::Admin)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }

    pub fn require_any(&self, roles: &[Role]) -> AppResult<()> {
        if self.roles.contains_any(roles) {
            Ok(())
        } else {
            tracing::debug!("User '{}' lacks any of {:?}", self.user_id, roles);
            Err(AppError::forbidden("You do not have permission to perform this action."))
        }
    }

    pub fn require_admin(&self) -> AppResult<()> {
        self.require_any(&[Role::Admin])
    }

    /// Teacher profile id of the caller, for writes that are stamped with the acting teacher.
    pub fn acting_teacher_id(&self) -> AppResult<i64> {
        self.require_any(&[Role::Teacher])?;
        self.teacher_id
            .ok_or_else(|| AppError::not_found("Teacher profile not found for current user."))
    }

    /// Student profile id of the caller, for the self-view endpoints.
    pub fn acting_student_id(&self) -> AppResult<i64> {
        self.require_any(&[Role::Student])?;
        self.student_id
            .ok_or_else(|| AppError::not_found("Student profile not found for current user."))
    }

    /// Only the owning teacher counts; Admin does not own courses.
    pub fn owns_course(&self, course_teacher_id: i64) -> bool {
        self.has_role(Role::Teacher) && self.teacher_id == Some(course_teacher_id)
    }

    /// Roster and enrollment management: Admin, or the owning teacher.
    pub fn can_manage_course(&self, course_teacher_id: i64) -> bool {
        self.is_admin() || self.owns_course(course_teacher_id)
    }

    pub fn ensure_can_manage_course(&self, course_teacher_id: i64) -> AppResult<()> {
        if self.can_manage_course(course_teacher_id) {
            Ok(())
        } else {
            Err(AppError::forbidden("You are not authorized to manage this course."))
        }
    }

    /// Grade and attendance writes: the owning teacher and nobody else.
    /// Returns the acting teacher id to stamp on the new row.
    pub fn ensure_course_owner(&self, course_teacher_id: i64) -> AppResult<i64> {
        let teacher_id = self.acting_teacher_id()?;
        if teacher_id == course_teacher_id {
            Ok(teacher_id)
        } else {
            Err(AppError::forbidden("You do not own this course."))
        }
    }

    /// Read rule for grade and attendance rows.
    pub fn can_read_record(&self, record_student_id: i64, record_teacher_id: i64) -> bool {
        self.is_admin()
            || (self.has_role(Role::Teacher) && self.teacher_id == Some(record_teacher_id))
            || (self.has_role(Role::Student) && self.student_id == Some(record_student_id))
    }

    pub fn ensure_can_read_record(&self, record_student_id: i64, record_teacher_id: i64) -> AppResult<()> {
        if self.can_read_record(record_student_id, record_teacher_id) {
            Ok(())
        } else {
            Err(AppError::forbidden("You are not allowed to view this record."))
        }
    }

    /// Student and teacher directories are readable by Admin and Teacher.
    pub fn can_read_directory(&self) -> bool {
        self.roles.contains_any(&[Role::Admin, Role::Teacher])
    }

    pub fn ensure_can_read_student(&self, student_id: i64) -> AppResult<()> {
        if self.can_read_directory() || self.student_id == Some(student_id) {
            Ok(())
        } else {
            Err(AppError::forbidden("You can only view your own profile."))
        }
    }

    pub fn ensure_can_read_teacher(&self, teacher_id: i64) -> AppResult<()> {
        if self.can_read_directory() || self.teacher_id == Some(teacher_id) {
            Ok(())
        } else {
            Err(AppError::forbidden("You can only view your own profile."))
        }
    }
}
