// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The shared bot handle and event dispatch.

use std::sync::Arc;

use grove_core::leave::Reason;
use grove_core::lock::keys;
use grove_core::{CoreError, DurableSet, KeyedLock, LeaveTracker, SessionStore, SharedSet};
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::error::Result;
use crate::events::{BotEvent, Command};
use crate::handlers::{bug_reports, membership, reactions, suggestions};
use crate::platform::{ChatPlatform, Embed};
use crate::suggestions::{Suggestion, SuggestionService};

/// Everything a handler needs, shared by every in-flight event.
pub struct Bot {
    /// Runtime configuration
    pub config: Config,
    /// Chat platform
    pub platform: Arc<dyn ChatPlatform>,
    /// Suggestion service
    pub suggestions: Arc<dyn SuggestionService>,
    /// Tracked bug-report threads
    pub bug_reports: SharedSet,
    /// Members inside membership screening
    pub pending_members: SharedSet,
    /// Departure reconciliation
    pub leave: Arc<LeaveTracker>,
    /// Paginated `/getsuggestions user` menus
    pub sessions: SessionStore<Suggestion, Embed>,
}

impl Bot {
    /// Load durable state and assemble the bot.
    ///
    /// Creates the data directory if needed. Fails if a durable set file
    /// exists but cannot be parsed.
    pub async fn load(
        config: Config,
        platform: Arc<dyn ChatPlatform>,
        suggestions: Arc<dyn SuggestionService>,
    ) -> Result<Arc<Self>> {
        tokio::fs::create_dir_all(&config.data_dir)
            .await
            .map_err(|source| CoreError::StoreIo {
                path: config.data_dir.clone(),
                source,
            })?;

        // One lock table coordinates every structure below.
        let locks = KeyedLock::new();

        let bug_reports = SharedSet::new(
            keys::BUG_REPORTS,
            locks.clone(),
            DurableSet::load(config.bug_reports_path()).await?,
        );
        let pending_members = SharedSet::new(
            keys::PENDING_MEMBERS,
            locks.clone(),
            DurableSet::load(config.pending_members_path()).await?,
        );

        let signals = Arc::new(membership::PlatformLeaveSignals::new(
            platform.clone(),
            &config,
        ));
        let leave = Arc::new(LeaveTracker::new(
            locks.clone(),
            signals,
            config.leave_tracker(),
        ));
        let sessions = SessionStore::new(locks.clone(), config.session_idle);

        info!(
            guild_id = %config.guild_id,
            data_dir = %config.data_dir.display(),
            "Bot state loaded"
        );

        Ok(Arc::new(Self {
            config,
            platform,
            suggestions,
            bug_reports,
            pending_members,
            leave,
            sessions,
        }))
    }

    /// Route one event to its handler.
    #[instrument(skip(self, event), fields(kind = event.kind()))]
    pub async fn dispatch(self: &Arc<Self>, event: BotEvent) -> Result<()> {
        match event {
            BotEvent::MemberJoined { member } => membership::member_joined(self, &member).await,
            BotEvent::MemberRemoved { member } => membership::member_removed(self, member).await,
            BotEvent::BanAdded { user, reason } => {
                membership::ban_added(self, user, Reason::from_optional(reason)).await
            }
            BotEvent::MemberUpdated {
                member,
                old_roles,
                new_roles,
            } => membership::member_updated(self, &member, &old_roles, &new_roles).await,
            BotEvent::MessageCreated { message } => {
                membership::message_created(self, &message).await
            }
            BotEvent::ThreadCreated { thread } => {
                if thread.parent_id == self.config.bug_reports_channel {
                    bug_reports::thread_created(self, &thread).await
                } else if thread.parent_id == self.config.suggestions_channel {
                    suggestions::thread_created(self, &thread).await
                } else {
                    debug!(parent_id = %thread.parent_id, "Ignoring thread outside tracked forums");
                    Ok(())
                }
            }
            BotEvent::ReactionAdded { reaction } => {
                reactions::reaction_changed(self, &reaction, true).await
            }
            BotEvent::ReactionRemoved { reaction } => {
                reactions::reaction_changed(self, &reaction, false).await
            }
            BotEvent::Command {
                interaction,
                command,
            } => match command {
                Command::EditBugs(command) => {
                    bug_reports::command(self, &interaction, command).await
                }
                Command::EditSuggestions(command) => {
                    suggestions::edit_command(self, &interaction, command).await
                }
                Command::GetSuggestions(command) => {
                    suggestions::get_command(self, &interaction, command).await
                }
            },
            BotEvent::Button {
                interaction,
                custom_id,
            } => suggestions::button(self, &interaction, &custom_id).await,
        }
    }
}
