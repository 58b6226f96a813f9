use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use anyhow::Result;
use async_trait::async_trait;
use httpmock::prelude::*;
use roster_airtable::{AirtableConfig, AirtableMembershipStore};
use roster_core::{
    AccountId, ChannelId, ChatAccount, MemberRoleGateway, MessageId, RoleChange, RoleId,
};
use roster_verify::{
    prime_channel, ChannelGateway, ChannelHistoryPage, DispatchReport, FormSpec,
    InteractionEvent, InteractionKind, InteractionResponder, InteractionRouter, MessageDeletion,
    PrimerReport, PrimerSettings, VerificationResolver, VerificationRoles, VerificationSettings,
    WelcomeMessage, MANAGER_FLAG_INPUT_ID, MEMBERSHIP_NUMBER_INPUT_ID, VERIFY_BUTTON_ID,
    VERIFY_MODAL_ID,
};
use serde_json::json;
use tokio::sync::Mutex as AsyncMutex;

const VERIFIED: RoleId = RoleId(901);
const MANAGER: RoleId = RoleId(902);
const INDIVIDUAL_CONTRIBUTOR: RoleId = RoleId(903);
const ADMIN: AccountId = AccountId(77);

fn settings() -> VerificationSettings {
    VerificationSettings {
        roles: VerificationRoles {
            verified: VERIFIED,
            manager: MANAGER,
            individual_contributor: INDIVIDUAL_CONTRIBUTOR,
        },
        admin_account: ADMIN,
    }
}

fn router_for(server: &MockServer) -> InteractionRouter {
    let mut config = AirtableConfig::new("pat-flow", "appFlow", "tblMembers", "tblDiscord");
    config.api_base = server.base_url();
    config.request_timeout_ms = 2_000;
    let store = AirtableMembershipStore::new(&config).expect("store");
    InteractionRouter::new(VerificationResolver::new(Arc::new(store)), settings())
}

fn form_event(account: &ChatAccount, number: &str, manager: &str) -> InteractionEvent {
    InteractionEvent {
        custom_id: VERIFY_MODAL_ID.to_string(),
        kind: InteractionKind::FormSubmit {
            fields: BTreeMap::from([
                (MEMBERSHIP_NUMBER_INPUT_ID.to_string(), number.to_string()),
                (MANAGER_FLAG_INPUT_ID.to_string(), manager.to_string()),
            ]),
        },
        account: account.clone(),
    }
}

#[derive(Default)]
struct GuildHarness {
    roles: AsyncMutex<BTreeMap<AccountId, BTreeSet<RoleId>>>,
    channel: AsyncMutex<BTreeSet<MessageId>>,
    welcomes: AsyncMutex<Vec<WelcomeMessage>>,
    replies: AsyncMutex<Vec<String>>,
    forms: AsyncMutex<Vec<&'static str>>,
}

impl GuildHarness {
    async fn seed_roles(&self, account: &ChatAccount) {
        self.roles
            .lock()
            .await
            .insert(account.id, account.roles.clone());
    }

    async fn roles_of(&self, account: AccountId) -> BTreeSet<RoleId> {
        self.roles
            .lock()
            .await
            .get(&account)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl MemberRoleGateway for GuildHarness {
    async fn grant_role(&self, account: AccountId, role: RoleId) -> Result<()> {
        self.roles
            .lock()
            .await
            .entry(account)
            .or_default()
            .insert(role);
        Ok(())
    }

    async fn revoke_role(&self, account: AccountId, role: RoleId) -> Result<()> {
        if let Some(roles) = self.roles.lock().await.get_mut(&account) {
            roles.remove(&role);
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelGateway for GuildHarness {
    async fn message_page(
        &self,
        _channel: ChannelId,
        before: Option<MessageId>,
    ) -> Result<ChannelHistoryPage> {
        let page: Vec<MessageId> = self
            .channel
            .lock()
            .await
            .iter()
            .rev()
            .filter(|message| before.map_or(true, |before| **message < before))
            .copied()
            .collect();
        if page.is_empty() {
            return Ok(ChannelHistoryPage::Empty);
        }
        Ok(ChannelHistoryPage::Messages(page))
    }

    async fn delete_message(
        &self,
        _channel: ChannelId,
        message: MessageId,
    ) -> Result<MessageDeletion> {
        if self.channel.lock().await.remove(&message) {
            Ok(MessageDeletion::Deleted)
        } else {
            Ok(MessageDeletion::AlreadyGone)
        }
    }

    async fn post_welcome(
        &self,
        _channel: ChannelId,
        welcome: &WelcomeMessage,
    ) -> Result<MessageId> {
        let mut channel = self.channel.lock().await;
        let id = MessageId(channel.iter().next_back().map_or(1, |last| last.get() + 1));
        channel.insert(id);
        self.welcomes.lock().await.push(*welcome);
        Ok(id)
    }
}

#[async_trait]
impl InteractionResponder for GuildHarness {
    async fn open_form(&self, form: &FormSpec) -> Result<()> {
        self.forms.lock().await.push(form.custom_id);
        Ok(())
    }

    async fn reply_ephemeral(&self, content: &str) -> Result<()> {
        self.replies.lock().await.push(content.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn integration_button_press_opens_verification_form_without_store_calls() {
    let server = MockServer::start();
    let reads = server.mock(|when, then| {
        when.method(GET);
        then.status(500);
    });
    let writes = server.mock(|when, then| {
        when.method(PATCH);
        then.status(500);
    });
    let router = router_for(&server);
    let guild = GuildHarness::default();
    let event = InteractionEvent {
        custom_id: VERIFY_BUTTON_ID.to_string(),
        kind: InteractionKind::ButtonPress,
        account: ChatAccount::new(AccountId(5), "newcomer", []),
    };

    let report = router
        .dispatch(&event, &guild, &guild)
        .await
        .expect("button dispatch");

    assert_eq!(report, DispatchReport::FormOpened);
    assert_eq!(*guild.forms.lock().await, vec![VERIFY_MODAL_ID]);
    assert!(guild.replies.lock().await.is_empty());
    assert_eq!(reads.calls(), 0);
    assert_eq!(writes.calls(), 0);
}

#[tokio::test]
async fn integration_manager_with_known_number_is_linked_and_granted_manager_roles() {
    let server = MockServer::start();
    let link_lookup = server.mock(|when, then| {
        when.method(GET)
            .path("/appFlow/tblDiscord")
            .query_param("filterByFormula", "{ID}=1001");
        then.status(200).json_body(json!({"records": []}));
    });
    let link_upsert = server.mock(|when, then| {
        when.method(PATCH).path("/appFlow/tblDiscord").json_body_includes(
            json!({
                "performUpsert": {"fieldsToMergeOn": ["ID"]},
                "records": [{"fields": {"ID": 1001, "Name": "casey"}}]
            })
            .to_string(),
        );
        then.status(200).json_body(json!({
            "records": [{"id": "recCasey", "fields": {"ID": 1001, "Name": "casey"}}],
            "createdRecords": ["recCasey"]
        }));
    });
    let member_lookup = server.mock(|when, then| {
        when.method(GET)
            .path("/appFlow/tblMembers")
            .query_param("filterByFormula", "{Member Number}=12345678");
        then.status(200).json_body(json!({
            "records": [{
                "id": "recMember",
                "fields": {"Member Number": 12345678, "Discord": ["recOther"]}
            }]
        }));
    });
    let member_reread = server.mock(|when, then| {
        when.method(GET).path("/appFlow/tblMembers/recMember");
        then.status(200).json_body(json!({
            "id": "recMember",
            "fields": {"Member Number": 12345678, "Discord": ["recOther"]}
        }));
    });
    let member_link = server.mock(|when, then| {
        when.method(PATCH)
            .path("/appFlow/tblMembers/recMember")
            .json_body(json!({"fields": {"Discord": ["recCasey", "recOther"]}}));
        then.status(200).json_body(json!({
            "id": "recMember",
            "fields": {"Member Number": 12345678, "Discord": ["recCasey", "recOther"]}
        }));
    });

    let router = router_for(&server);
    let guild = GuildHarness::default();
    let casey = ChatAccount::new(AccountId(1001), "casey", [INDIVIDUAL_CONTRIBUTOR]);
    guild.seed_roles(&casey).await;

    let report = router
        .dispatch(&form_event(&casey, "12345678", "Y"), &guild, &guild)
        .await
        .expect("verification dispatch");

    let DispatchReport::Verified {
        membership_number,
        manager,
        roles,
    } = report
    else {
        panic!("expected verified report");
    };
    assert_eq!(membership_number, "12345678");
    assert!(manager);
    assert_eq!(
        roles.applied,
        vec![
            RoleChange::Grant(VERIFIED),
            RoleChange::Grant(MANAGER),
            RoleChange::Revoke(INDIVIDUAL_CONTRIBUTOR),
        ]
    );
    assert_eq!(
        guild.roles_of(casey.id).await,
        BTreeSet::from([VERIFIED, MANAGER])
    );
    let replies = guild.replies.lock().await.clone();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("12345678"));

    link_lookup.assert();
    link_upsert.assert();
    member_lookup.assert();
    member_reread.assert();
    member_link.assert();
}

#[tokio::test]
async fn integration_unknown_number_revokes_all_roles_and_names_entered_number() {
    let server = MockServer::start();
    let link_lookup = server.mock(|when, then| {
        when.method(GET)
            .path("/appFlow/tblDiscord")
            .query_param("filterByFormula", "{ID}=2002");
        then.status(200).json_body(json!({
            "records": [{"id": "recDrew", "fields": {"ID": 2002, "Name": "drew"}}]
        }));
    });
    let member_lookup = server.mock(|when, then| {
        when.method(GET)
            .path("/appFlow/tblMembers")
            .query_param("filterByFormula", "{Member Number}=0");
        then.status(200).json_body(json!({"records": []}));
    });
    let writes = server.mock(|when, then| {
        when.method(PATCH);
        then.status(500);
    });

    let router = router_for(&server);
    let guild = GuildHarness::default();
    let drew = ChatAccount::new(AccountId(2002), "drew", [VERIFIED, INDIVIDUAL_CONTRIBUTOR]);
    guild.seed_roles(&drew).await;

    let report = router
        .dispatch(&form_event(&drew, "00000000", "n"), &guild, &guild)
        .await
        .expect("verification dispatch");

    let DispatchReport::MembershipNotFound {
        membership_number,
        roles,
    } = report
    else {
        panic!("expected membership-not-found report");
    };
    assert_eq!(membership_number, "00000000");
    assert_eq!(
        roles.applied,
        vec![
            RoleChange::Revoke(VERIFIED),
            RoleChange::Revoke(INDIVIDUAL_CONTRIBUTOR),
        ]
    );
    assert!(guild.roles_of(drew.id).await.is_empty());
    let replies = guild.replies.lock().await.clone();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("00000000"));
    assert!(replies[0].contains("<@77>"));

    link_lookup.assert();
    member_lookup.assert();
    assert_eq!(writes.calls(), 0);
}

#[tokio::test]
async fn integration_primer_clears_history_then_posts_single_welcome() {
    let guild = GuildHarness::default();
    guild
        .channel
        .lock()
        .await
        .extend([MessageId(10), MessageId(11), MessageId(12)]);
    let settings = PrimerSettings {
        channel: ChannelId(55),
        resend_intro: true,
    };

    let report = prime_channel(&guild, &settings).await.expect("primer");

    let PrimerReport::Primed {
        deleted,
        already_gone,
        ..
    } = report
    else {
        panic!("expected primed report");
    };
    assert_eq!(deleted, 3);
    assert_eq!(already_gone, 0);
    let welcomes = guild.welcomes.lock().await.clone();
    assert_eq!(welcomes.len(), 1);
    assert_eq!(welcomes[0].button.custom_id, VERIFY_BUTTON_ID);
    assert_eq!(guild.channel.lock().await.len(), 1);
}

#[tokio::test]
async fn regression_primer_disabled_leaves_channel_untouched() {
    let guild = GuildHarness::default();
    guild.channel.lock().await.extend([MessageId(10), MessageId(11)]);
    let settings = PrimerSettings {
        channel: ChannelId(55),
        resend_intro: false,
    };

    let report = prime_channel(&guild, &settings).await.expect("primer");

    assert_eq!(report, PrimerReport::Skipped);
    assert_eq!(guild.channel.lock().await.len(), 2);
    assert!(guild.welcomes.lock().await.is_empty());
}
