use chrono::NaiveDateTime as DateTime;
use thiserror::Error;

use crate::utils;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Reasons a campaign cannot be claimed, each distinct for display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Claim {
  #[error("campaign already claimed by this user")]
  AlreadyClaimed,
  #[error("group membership required")]
  MembershipRequired,
  #[error("campaign is not active")]
  Inactive,
  #[error("campaign has expired")]
  Expired,
  #[error("campaign limit exhausted")]
  LimitExhausted,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Db(#[from] sea_orm::DbErr),
  #[error("user not found")]
  UserNotFound,
  #[error("campaign not found")]
  CampaignNotFound,
  #[error("staff member not found")]
  StaffNotFound,
  #[error(transparent)]
  Claim(#[from] Claim),
  #[error("no claim with this code exists")]
  CodeNotFound,
  #[error("code was already redeemed")]
  AlreadyRedeemed { campaign: Option<String>, at: DateTime },
  #[error("campaign for this code no longer exists")]
  CampaignMissing,
  #[error("limit cannot be lower than the used count ({used})")]
  LimitBelowUsage { used: i32 },
  #[error("invalid date")]
  InvalidDate,
  #[error("invalid number")]
  InvalidNumber,
  #[error("staff members cannot modify their own record")]
  CannotModifySelf,
  #[error("unauthorized")]
  Unauthorized,
  #[error("{0}")]
  InvalidArgs(String),
  #[error("internal error: {0}")]
  Internal(String),
}

impl Error {
  /// Message shown to the end user. Unexpected failures collapse into a
  /// generic reply; the real cause goes to the log at the boundary.
  pub fn user_message(&self) -> String {
    match self {
      Error::Db(_) => "An error occurred. Please try again later.".into(),
      Error::UserNotFound => {
        "You are not registered yet. Send /start first.".into()
      }
      Error::CampaignNotFound => "Campaign not found.".into(),
      Error::StaffNotFound => "Staff member not found.".into(),
      Error::Claim(Claim::AlreadyClaimed) => {
        "You have already claimed a code from this campaign.".into()
      }
      Error::Claim(Claim::MembershipRequired) => {
        "To claim a code you must be a member of our group.".into()
      }
      Error::Claim(Claim::Inactive) => {
        "This campaign is no longer active.".into()
      }
      Error::Claim(Claim::Expired) => "This campaign has expired.".into(),
      Error::Claim(Claim::LimitExhausted) => {
        "All codes of this campaign have been claimed.".into()
      }
      Error::CodeNotFound => "This code does not belong to any user.".into(),
      Error::AlreadyRedeemed { campaign, at } => format!(
        "This code was already redeemed!\n\nCampaign: {}\nRedeemed: {}",
        campaign.as_deref().unwrap_or("removed campaign"),
        utils::format_date(*at)
      ),
      Error::CampaignMissing => {
        "The campaign behind this code was removed. The code cannot be redeemed.".into()
      }
      Error::LimitBelowUsage { used } => format!(
        "The limit cannot be lower than the number of codes already claimed ({used})."
      ),
      Error::InvalidDate => {
        "Invalid date. Use DD.MM.YYYY with a date in the future.".into()
      }
      Error::InvalidNumber => "Please enter a positive whole number.".into(),
      Error::CannotModifySelf => "You cannot modify your own record.".into(),
      Error::Unauthorized => "You do not have access to this action.".into(),
      Error::InvalidArgs(msg) => msg.clone(),
      Error::Internal(_) => "An error occurred. Please try again later.".into(),
    }
  }

  pub fn is_unique_violation(&self) -> bool {
    matches!(
      self,
      Error::Db(err)
        if matches!(err.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_)))
    )
  }
}
