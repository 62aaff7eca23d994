//! Actuator pipeline
//!
//! One [`SurfaceActuator`] owns one page session and runs the fixed stage
//! sequence against it: readiness, relationship precheck, primary action,
//! dialog wait, optional note, confirmation, verification. Every halt is a
//! [`FlowError`] that maps onto exactly one [`ActionResult`].

use std::sync::Arc;

use action_locator::{DefaultElementResolver, ElementResolver, Resolution, Role};
use action_primitives::{poll_until, DomSnapshot, ElementRef, RetryPolicy, ScopeFlags, Surface};
use async_trait::async_trait;
use outreach_core_types::{ActionResult, ActuatorCommand, FailureReason, SkipReason};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::errors::FlowError;
use crate::personalize::personalize;
use crate::types::{ActuatorTimings, Stage};

/// Performs one command against one surface and reports a single result.
#[async_trait]
pub trait Actuator: Send + Sync {
    async fn perform(&self, command: &ActuatorCommand) -> ActionResult;
}

/// Actuator driving a [`Surface`] through the element resolver.
pub struct SurfaceActuator {
    surface: Arc<dyn Surface>,
    resolver: DefaultElementResolver,
    timings: ActuatorTimings,
}

impl SurfaceActuator {
    pub fn new(surface: Arc<dyn Surface>) -> Self {
        Self::with_timings(surface, ActuatorTimings::default())
    }

    pub fn with_timings(surface: Arc<dyn Surface>, timings: ActuatorTimings) -> Self {
        Self {
            surface,
            resolver: DefaultElementResolver::new(),
            timings,
        }
    }

    pub fn timings(&self) -> &ActuatorTimings {
        &self.timings
    }

    async fn snapshot(&self) -> Result<DomSnapshot, FlowError> {
        Ok(self.surface.snapshot().await?)
    }

    async fn click(&self, resolution: &Resolution) -> Result<(), FlowError> {
        debug!(
            role = %resolution.role,
            strategy = resolution.strategy.name(),
            element = %resolution.element,
            "clicking"
        );
        Ok(self.surface.click(&resolution.element).await?)
    }

    /// Poll fresh snapshots until `pick` yields a value.
    ///
    /// Transient surface errors count as an empty probe; a closed surface
    /// ends the wait with an error.
    async fn poll_snapshot<T, F>(&self, policy: &RetryPolicy, pick: F) -> Result<Option<T>, FlowError>
    where
        T: Send,
        F: Fn(&DomSnapshot) -> Option<T> + Sync,
    {
        let surface = self.surface.as_ref();
        let pick = &pick;
        let outcome = poll_until(policy, move |attempt| async move {
            match surface.snapshot().await {
                Ok(snapshot) => pick(&snapshot).map(Ok),
                Err(err) if err.is_terminal() => Some(Err(err)),
                Err(err) => {
                    debug!(attempt, error = %err, "snapshot failed, retrying");
                    None
                }
            }
        })
        .await;
        Ok(outcome.into_option().transpose()?)
    }

    async fn run(&self, template: &str) -> Result<String, FlowError> {
        let ready = self.wait_ready().await?;
        let subject = self.resolver.subject_name(&ready);
        info!(subject = %subject, "surface ready");

        self.precheck(&ready).await?;
        self.activate_primary(ready).await?;
        let dialog = self.wait_dialog().await?;

        if template.trim().is_empty() {
            debug!(stage = %Stage::Note, "no message template, skipping note");
        } else {
            let message = personalize(template, &subject);
            self.attach_note(&message).await?;
        }

        self.confirm().await?;
        self.verify(&dialog).await?;
        Ok(subject)
    }

    async fn wait_ready(&self) -> Result<DomSnapshot, FlowError> {
        self.poll_snapshot(&self.timings.readiness, |snapshot| {
            snapshot.has_main.then(|| snapshot.clone())
        })
        .await?
        .ok_or(FlowError::Failed(FailureReason::TimeoutWaitingForPage))
    }

    /// Detect an existing connection or an outstanding invitation.
    async fn precheck(&self, ready: &DomSnapshot) -> Result<(), FlowError> {
        let first_degree = self
            .resolver
            .resolve(Role::DistanceBadge, ready)
            .is_some_and(|badge| badge.text.trim() == "1st");

        if first_degree {
            if let Some(more) = self.resolver.resolve(Role::MoreActions, ready) {
                self.click(&more).await?;
                sleep(self.timings.menu_open).await;
                let menu = self.snapshot().await?;
                let removable = self.resolver.present(Role::RemoveConnection, &menu);
                self.surface.dismiss_menus().await?;
                sleep(self.timings.menu_dismiss).await;
                if removable {
                    info!(stage = %Stage::Precheck, "already connected");
                    return Err(FlowError::Skip(SkipReason::AlreadyConnected));
                }
            }
        }

        let current = self.snapshot().await?;
        if let Some(pending) = self.resolver.resolve(Role::PendingIndicator, &current) {
            info!(stage = %Stage::Precheck, element = %pending.element, "invitation pending");
            return Err(FlowError::Skip(SkipReason::Pending));
        }
        Ok(())
    }

    /// Activate the connect control, directly or through the disclosure menu.
    async fn activate_primary(&self, ready: DomSnapshot) -> Result<(), FlowError> {
        let mut current = ready;
        if let Some(connect) = self.resolver.resolve(Role::ConnectAffordance, &current) {
            info!(stage = %Stage::PrimaryAction, strategy = connect.strategy.name(), "connect found");
            return self.click(&connect).await;
        }

        if let Some(more) = self.resolver.resolve(Role::MoreActions, &current) {
            self.click(&more).await?;
            sleep(self.timings.menu_open).await;
            current = self.snapshot().await?;
            if let Some(entry) = self.resolver.resolve(Role::MenuConnect, &current) {
                info!(stage = %Stage::PrimaryAction, "connect found in menu");
                return self.click(&entry).await;
            }
            debug!(stage = %Stage::PrimaryAction, "no connect entry in menu, closing it");
            self.surface.dismiss_menus().await?;
            sleep(self.timings.menu_dismiss).await;
            current = self.snapshot().await?;
        }

        let follow_only = self.resolver.present(Role::FollowAffordance, &current)
            && !self.resolver.present(Role::AnyConnectControl, &current)
            && !self.resolver.present(Role::MenuConnect, &current);
        if follow_only {
            info!(stage = %Stage::PrimaryAction, "follow only");
            return Err(FlowError::Skip(SkipReason::FollowOnly));
        }

        warn!(stage = %Stage::PrimaryAction, "connect control not found");
        Err(FlowError::Failed(FailureReason::ConnectControlNotFound))
    }

    /// Wait for the response dialog and return the node that opened.
    async fn wait_dialog(&self) -> Result<ElementRef, FlowError> {
        let resolver = &self.resolver;
        let dialog = self
            .poll_snapshot(&self.timings.dialog, |snapshot| {
                resolver.resolve(Role::Dialog, snapshot)
            })
            .await?
            .ok_or(FlowError::Failed(FailureReason::NoResponseDialog))?;
        debug!(stage = %Stage::DialogWait, element = %dialog.element, "dialog open");
        sleep(self.timings.dialog_render).await;
        Ok(dialog.element)
    }

    /// Enable the note field and type the message. Any failure here aborts
    /// the item; the invitation is never sent without its note.
    async fn attach_note(&self, message: &str) -> Result<(), FlowError> {
        let current = self.snapshot().await?;
        let field = if let Some(toggle) = self.resolver.resolve(Role::NoteToggle, &current) {
            self.click(&toggle).await?;
            let resolver = &self.resolver;
            self.poll_snapshot(&self.timings.note_field, |snapshot| {
                resolver.resolve(Role::MessageField, snapshot)
            })
            .await?
            .ok_or(FlowError::Failed(FailureReason::CouldNotTypeMessage))?
            .element
        } else if let Some(field) =
            self.resolver
                .resolve_within(Role::MessageField, &current, ScopeFlags::DIALOG)
        {
            debug!(stage = %Stage::Note, "message field already visible");
            field.element
        } else {
            info!(stage = %Stage::Note, "no note toggle, sending without note");
            return Ok(());
        };
        self.type_message(&field, message).await
    }

    async fn type_message(&self, field: &ElementRef, message: &str) -> Result<(), FlowError> {
        self.surface.fill(field, message).await?;
        sleep(self.timings.note_readback).await;
        let echoed = self.surface.read_value(field).await?;
        if echoed.as_deref() == Some(message) {
            debug!(stage = %Stage::Note, chars = message.chars().count(), "note typed");
            Ok(())
        } else {
            warn!(stage = %Stage::Note, "note read-back mismatch");
            Err(FlowError::Failed(FailureReason::CouldNotTypeMessage))
        }
    }

    async fn confirm(&self) -> Result<(), FlowError> {
        let resolver = &self.resolver;
        let send = self
            .poll_snapshot(&self.timings.send, |snapshot| {
                resolver.resolve(Role::SendAffordance, snapshot)
            })
            .await?
            .ok_or(FlowError::Failed(FailureReason::SendControlNotFound))?;
        info!(stage = %Stage::Confirm, strategy = send.strategy.name(), "sending");
        self.click(&send).await
    }

    /// Check that the dialog used for this invitation has gone away.
    async fn verify(&self, dialog: &ElementRef) -> Result<(), FlowError> {
        sleep(self.timings.verify_settle).await;
        let current = self.snapshot().await?;
        if invite_dialog_open(&current, dialog) {
            warn!(stage = %Stage::Verify, "invite dialog still open after send");
            return Err(FlowError::Failed(FailureReason::DialogStillOpen));
        }
        Ok(())
    }
}

/// Whether the dialog interacted with is still visible as an invitation.
fn invite_dialog_open(snapshot: &DomSnapshot, dialog: &ElementRef) -> bool {
    snapshot.get(dialog).is_some_and(|node| {
        node.visible
            && (node.is_in(ScopeFlags::INVITE)
                || node.has_class("send-invite")
                || node.modal_id.as_deref() == Some("send-invite-modal"))
    })
}

#[async_trait]
impl Actuator for SurfaceActuator {
    async fn perform(&self, command: &ActuatorCommand) -> ActionResult {
        let ActuatorCommand::SendConnection { message } = command;
        match self.run(message).await {
            Ok(subject) => {
                info!(subject = %subject, "connection request sent");
                ActionResult::success(subject)
            }
            Err(err) => {
                info!(outcome = %err, "pipeline halted");
                err.into_result()
            }
        }
    }
}
