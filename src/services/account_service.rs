use std::{cmp::Ordering, sync::Arc};

use uuid::Uuid;

use crate::{
    auth::{
        UserStatus,
        password::{hash_password, verify_password},
    },
    db::{
        dao::{NewUser, ProfileChanges},
        entities::user,
    },
    error::AppError,
    flash::Flash,
    forms::{EditProfileForm, FormErrors, LoginForm, PasswordForm, RegisterForm},
};

use super::repository::{AccountRepository, LoanRecord};

const UNKNOWN_EMAIL: &str = "Login failed: there is no user with this email address.";
const WRONG_PASSWORD: &str = "Login failed: the password is incorrect.";
const EMAIL_TAKEN: &str = "This email address is already registered.";
const WRONG_OLD_PASSWORD: &str = "Wrong password. Enter your current password.";
const LAST_ADMIN: &str = "You are the only administrator, you cannot delete your profile.";
const OPEN_LOANS: &str = "You still have books on loan.";

/// Result of a submitted form: either the change went through, or the form
/// comes back with per-field errors and nothing was written.
#[derive(Debug)]
pub enum FormOutcome<T> {
    Accepted { value: T, flashes: Vec<Flash> },
    Rejected(FormErrors),
}

impl<T> FormOutcome<T> {
    fn accepted(value: T, flash: Flash) -> Self {
        FormOutcome::Accepted {
            value,
            flashes: vec![flash],
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(Flash),
    Refused(Flash),
}

#[derive(Clone)]
pub struct AccountService {
    repo: Arc<dyn AccountRepository>,
}

impl AccountService {
    pub fn new(repo: Arc<dyn AccountRepository>) -> Self {
        Self { repo }
    }

    /// Identity loader: absent ids resolve to an anonymous request.
    pub async fn load_user(&self, id: &Uuid) -> Result<Option<user::Model>, AppError> {
        Ok(self.repo.find_user_by_id(id).await?)
    }

    pub async fn login(&self, form: &LoginForm) -> Result<FormOutcome<user::Model>, AppError> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Ok(FormOutcome::Rejected(errors));
        }

        let Some(mut user) = self.repo.find_user_by_email(form.email.trim()).await? else {
            tracing::info!("login attempt for unknown email");
            return Ok(FormOutcome::Rejected(
                FormErrors::new().with("email", UNKNOWN_EMAIL),
            ));
        };

        if !verify_password(&form.password, &user.password_hash)? {
            tracing::warn!(user_id = %user.id, "login failed: wrong password");
            return Ok(FormOutcome::Rejected(
                FormErrors::new().with("password", WRONG_PASSWORD),
            ));
        }

        let now = chrono::Utc::now().fixed_offset();
        self.repo.set_last_login(&user.id, &now).await?;
        user.last_login = Some(now);

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(FormOutcome::Accepted {
            value: user,
            flashes: Vec::new(),
        })
    }

    pub async fn register(
        &self,
        form: &RegisterForm,
    ) -> Result<FormOutcome<user::Model>, AppError> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Ok(FormOutcome::Rejected(errors));
        }

        let email = form.email.trim();
        if self.repo.find_user_by_email(email).await?.is_some() {
            return Ok(FormOutcome::Rejected(
                FormErrors::new().with("email", EMAIL_TAKEN),
            ));
        }

        let user = self
            .repo
            .create_user(NewUser {
                first_name: form.first_name.trim().to_string(),
                last_name: form.last_name.trim().to_string(),
                email: email.to_string(),
                phone_number: form.phone_number.trim().to_string(),
                password_hash: hash_password(&form.password)?,
                status: UserStatus::Client,
                created_on: chrono::Utc::now().fixed_offset(),
            })
            .await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(FormOutcome::accepted(
            user,
            Flash::success("Your profile has been registered. Please log in."),
        ))
    }

    pub async fn edit_profile(
        &self,
        current: &user::Model,
        form: &EditProfileForm,
    ) -> Result<FormOutcome<user::Model>, AppError> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Ok(FormOutcome::Rejected(errors));
        }

        let email = form.email.trim();
        let taken = self
            .repo
            .find_user_by_email(email)
            .await?
            .is_some_and(|owner| owner.id != current.id);
        if taken {
            return Ok(FormOutcome::Rejected(
                FormErrors::new().with("email", EMAIL_TAKEN),
            ));
        }

        let user = self
            .repo
            .update_profile(
                &current.id,
                ProfileChanges {
                    first_name: form.first_name.trim().to_string(),
                    last_name: form.last_name.trim().to_string(),
                    email: email.to_string(),
                    phone_number: form.phone_number.trim().to_string(),
                },
            )
            .await?;

        tracing::info!(user_id = %user.id, "profile updated");
        Ok(FormOutcome::accepted(
            user,
            Flash::success("Your profile has been updated."),
        ))
    }

    /// On success the caller must end the session.
    pub async fn change_password(
        &self,
        current: &user::Model,
        form: &PasswordForm,
    ) -> Result<FormOutcome<()>, AppError> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Ok(FormOutcome::Rejected(errors));
        }

        if !verify_password(&form.password, &current.password_hash)? {
            tracing::warn!(user_id = %current.id, "password change refused: wrong password");
            return Ok(FormOutcome::Rejected(
                FormErrors::new().with("password", WRONG_OLD_PASSWORD),
            ));
        }

        let hash = hash_password(&form.new_password)?;
        self.repo.set_password_hash(&current.id, &hash).await?;

        tracing::info!(user_id = %current.id, "password changed");
        Ok(FormOutcome::accepted(
            (),
            Flash::success("Your password has been changed. Please log in again."),
        ))
    }

    pub fn delete_warning(&self) -> Flash {
        Flash::warning("Deleting your profile also deletes your loan history.")
    }

    /// Refuses for the last administrator, then for outstanding loans; only
    /// when both checks pass is anything written.
    pub async fn delete_account(&self, current: &user::Model) -> Result<DeleteOutcome, AppError> {
        if current.is_admin() && self.repo.count_admins().await? < 2 {
            tracing::warn!(user_id = %current.id, "delete refused: last administrator");
            return Ok(DeleteOutcome::Refused(Flash::danger(LAST_ADMIN)));
        }

        let loans = self.repo.find_loans_for_user(&current.id).await?;
        if loans.iter().any(LoanRecord::is_open) {
            tracing::warn!(user_id = %current.id, "delete refused: books still on loan");
            return Ok(DeleteOutcome::Refused(Flash::danger(OPEN_LOANS)));
        }

        self.repo.delete_user(&current.id).await?;
        tracing::info!(user_id = %current.id, "user deleted");
        Ok(DeleteOutcome::Deleted(Flash::info(
            "Your profile has been deleted.",
        )))
    }

    pub async fn profile_loans(&self, current: &user::Model) -> Result<Vec<LoanRecord>, AppError> {
        Ok(self.repo.find_open_loans_for_user(&current.id).await?)
    }

    /// Open loans first, then by return date and loan date, newest first.
    pub async fn loan_history(
        &self,
        current: &user::Model,
        only_open: bool,
    ) -> Result<Vec<LoanRecord>, AppError> {
        let mut loans = self.repo.find_loans_for_user(&current.id).await?;
        loans.sort_by(history_order);
        if only_open {
            loans.retain(LoanRecord::is_open);
        }
        Ok(loans)
    }
}

fn history_order(a: &LoanRecord, b: &LoanRecord) -> Ordering {
    let by_return = match (a.return_date, b.return_date) {
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (left, right) => right.cmp(&left),
    };
    by_return.then_with(|| b.loan_date.cmp(&a.loan_date))
}
