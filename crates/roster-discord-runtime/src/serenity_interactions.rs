//! Conversion between serenity interactions and router events.

use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicBool, Ordering},
};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use roster_core::{AccountId, ChatAccount, GuildId, RoleId};
use roster_verify::{FormSpec, InteractionEvent, InteractionKind, InteractionResponder};
use serenity::all::{
    ActionRow, ActionRowComponent, ComponentInteraction, ComponentInteractionDataKind,
    CreateActionRow, CreateInputText, CreateInteractionResponse,
    CreateInteractionResponseFollowup, CreateInteractionResponseMessage, CreateModal, Http, InputTextStyle, Member,
    ModalInteraction,
};

pub(crate) fn chat_account_from_member(member: &Member) -> ChatAccount {
    ChatAccount::new(
        AccountId(member.user.id.get()),
        member.user.tag(),
        member.roles.iter().map(|role| RoleId(role.get())),
    )
}

pub(crate) fn in_configured_guild(interaction_guild: Option<u64>, configured: GuildId) -> bool {
    interaction_guild == Some(configured.get())
}

/// Button presses only; select menus are not part of the flow.
pub(crate) fn component_event(component: &ComponentInteraction) -> Option<InteractionEvent> {
    if !matches!(component.data.kind, ComponentInteractionDataKind::Button) {
        return None;
    }
    let member = component.member.as_ref()?;
    Some(InteractionEvent {
        custom_id: component.data.custom_id.clone(),
        kind: InteractionKind::ButtonPress,
        account: chat_account_from_member(member),
    })
}

pub(crate) fn modal_event(modal: &ModalInteraction) -> Option<InteractionEvent> {
    let member = modal.member.as_ref()?;
    Some(InteractionEvent {
        custom_id: modal.data.custom_id.clone(),
        kind: InteractionKind::FormSubmit {
            fields: modal_fields(&modal.data.components),
        },
        account: chat_account_from_member(member),
    })
}

fn modal_fields(rows: &[ActionRow]) -> BTreeMap<String, String> {
    collect_text_inputs(rows.iter().flat_map(|row| {
        row.components.iter().filter_map(|component| match component {
            ActionRowComponent::InputText(input) => {
                Some((input.custom_id.clone(), input.value.clone()))
            }
            _ => None,
        })
    }))
}

pub(crate) fn collect_text_inputs(
    inputs: impl IntoIterator<Item = (String, Option<String>)>,
) -> BTreeMap<String, String> {
    inputs
        .into_iter()
        .map(|(custom_id, value)| (custom_id, value.unwrap_or_default()))
        .collect()
}

fn modal_response(form: &FormSpec) -> CreateInteractionResponse {
    let rows = form
        .inputs
        .iter()
        .map(|input| {
            CreateActionRow::InputText(
                CreateInputText::new(InputTextStyle::Short, input.label, input.custom_id)
                    .min_length(input.length)
                    .max_length(input.length)
                    .required(true),
            )
        })
        .collect();
    CreateInteractionResponse::Modal(CreateModal::new(form.custom_id, form.title).components(rows))
}

fn ephemeral_response(content: &str) -> CreateInteractionResponse {
    CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    )
}

#[derive(Clone, Copy)]
pub(crate) enum InteractionTarget<'a> {
    Component(&'a ComponentInteraction),
    Modal(&'a ModalInteraction),
}

/// Answers the interaction that produced the current router event.
///
/// Once deferred, ephemeral replies are sent as follow-up messages.
pub(crate) struct SerenityInteractionResponder<'a> {
    http: &'a Http,
    target: InteractionTarget<'a>,
    deferred: AtomicBool,
}

impl<'a> SerenityInteractionResponder<'a> {
    pub(crate) fn new(http: &'a Http, target: InteractionTarget<'a>) -> Self {
        Self {
            http,
            target,
            deferred: AtomicBool::new(false),
        }
    }

    /// Acknowledges the interaction within Discord's initial response window.
    pub(crate) async fn defer_ephemeral(&self) -> Result<()> {
        self.respond(CreateInteractionResponse::Defer(
            CreateInteractionResponseMessage::new().ephemeral(true),
        ))
        .await
        .context("discord deferred response failed")?;
        self.deferred.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn follow_up(&self, content: &str) -> serenity::Result<()> {
        let followup = CreateInteractionResponseFollowup::new()
            .content(content)
            .ephemeral(true);
        match self.target {
            InteractionTarget::Component(interaction) => {
                interaction.create_followup(self.http, followup).await?;
            }
            InteractionTarget::Modal(interaction) => {
                interaction.create_followup(self.http, followup).await?;
            }
        }
        Ok(())
    }

    async fn respond(&self, response: CreateInteractionResponse) -> serenity::Result<()> {
        match self.target {
            InteractionTarget::Component(interaction) => {
                interaction.create_response(self.http, response).await
            }
            InteractionTarget::Modal(interaction) => {
                interaction.create_response(self.http, response).await
            }
        }
    }
}

#[async_trait]
impl InteractionResponder for SerenityInteractionResponder<'_> {
    async fn open_form(&self, form: &FormSpec) -> Result<()> {
        let InteractionTarget::Component(interaction) = self.target else {
            bail!("a form can only be opened in response to a component interaction");
        };
        interaction
            .create_response(self.http, modal_response(form))
            .await
            .context("discord modal response failed")
    }

    async fn reply_ephemeral(&self, content: &str) -> Result<()> {
        if self.deferred.load(Ordering::SeqCst) {
            return self
                .follow_up(content)
                .await
                .context("discord ephemeral follow-up failed");
        }
        self.respond(ephemeral_response(content))
            .await
            .context("discord ephemeral reply failed")
    }
}
