//! Route status mutation protocol
//!
//! A status change is a form POST back to the balancer-manager page. The
//! console expects every status field on each POST, so a partial update is
//! first merged over the route's current flags.
//!
//! The steps, driven by [`crate::client::Client::change_status`]:
//! 1. [`check_supported`] - Apache 2.2 only allows toggling `Disabled`
//! 2. [`merge`] - apply the requested flags over the current ones
//! 3. [`build_form`] - produce the exact form fields, nonce included
//! 4. submit, then store the merged flags on the route

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Route, RouteStatus, StatusFlag};
use crate::parser::ApacheVersion;

/// Requested flag changes; `None` leaves a flag as it is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_errors: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draining_mode: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hot_standby: Option<bool>,
}

impl StatusUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request `flag` to be set to `value`
    pub fn set(mut self, flag: StatusFlag, value: bool) -> Self {
        *self.slot(flag) = Some(value);
        self
    }

    pub fn ignore_errors(self, value: bool) -> Self {
        self.set(StatusFlag::IgnoreErrors, value)
    }

    pub fn draining_mode(self, value: bool) -> Self {
        self.set(StatusFlag::DrainingMode, value)
    }

    pub fn disabled(self, value: bool) -> Self {
        self.set(StatusFlag::Disabled, value)
    }

    pub fn hot_standby(self, value: bool) -> Self {
        self.set(StatusFlag::HotStandby, value)
    }

    /// Requested value for `flag`, if any
    pub fn get(&self, flag: StatusFlag) -> Option<bool> {
        match flag {
            StatusFlag::IgnoreErrors => self.ignore_errors,
            StatusFlag::DrainingMode => self.draining_mode,
            StatusFlag::Disabled => self.disabled,
            StatusFlag::HotStandby => self.hot_standby,
        }
    }

    fn slot(&mut self, flag: StatusFlag) -> &mut Option<bool> {
        match flag {
            StatusFlag::IgnoreErrors => &mut self.ignore_errors,
            StatusFlag::DrainingMode => &mut self.draining_mode,
            StatusFlag::Disabled => &mut self.disabled,
            StatusFlag::HotStandby => &mut self.hot_standby,
        }
    }

    /// Flags this update touches, with their requested values
    pub fn touched(&self) -> impl Iterator<Item = (StatusFlag, bool)> + '_ {
        StatusFlag::ALL
            .into_iter()
            .filter_map(|flag| self.get(flag).map(|value| (flag, value)))
    }

    pub fn is_empty(&self) -> bool {
        self.touched().next().is_none()
    }
}

impl FromIterator<(StatusFlag, bool)> for StatusUpdate {
    fn from_iter<I: IntoIterator<Item = (StatusFlag, bool)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |update, (flag, value)| update.set(flag, value))
    }
}

/// Reject flag changes the server version cannot apply
///
/// # Errors
///
/// Returns `Error::UnsupportedOperation` when the server is Apache 2.2 and
/// the update touches anything but `Disabled`.
pub fn check_supported(version: &ApacheVersion, update: &StatusUpdate) -> Result<()> {
    if !version.is("2.2") {
        return Ok(());
    }

    match update
        .touched()
        .find(|(flag, _)| *flag != StatusFlag::Disabled)
    {
        Some((flag, _)) => Err(Error::UnsupportedOperation {
            version: version.to_string(),
            flag,
        }),
        None => Ok(()),
    }
}

/// Apply `update` over `current`, leaving untouched flags as they are
pub fn merge(current: &RouteStatus, update: &StatusUpdate) -> RouteStatus {
    let mut target = *current;
    for (flag, value) in update.touched() {
        target.set(flag, value);
    }
    target
}

fn form_bool(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

/// Build the form the console expects for setting `route` to `target`
///
/// # Errors
///
/// Returns `Error::MissingNonce` if the route was parsed without a nonce.
pub fn build_form(route: &Route, target: &RouteStatus) -> Result<Vec<(&'static str, String)>> {
    let nonce = route.session_nonce.ok_or_else(|| Error::MissingNonce {
        cluster: route.cluster.name.clone(),
        route: route.name.clone(),
    })?;

    let mut form = vec![
        ("w_lf", "1".to_string()),
        ("w_ls", "0".to_string()),
        ("w_wr", route.name.clone()),
        ("w_rr", String::new()),
    ];

    form.extend(
        StatusFlag::ALL
            .into_iter()
            .map(|flag| (flag.form_key(), form_bool(target.get(flag)))),
    );

    form.push(("w", route.worker.clone()));
    form.push(("b", route.cluster.name.clone()));
    form.push(("nonce", nonce.hyphenated().to_string()));

    Ok(form)
}
