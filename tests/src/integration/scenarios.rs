//! # Command Flow Scenarios
//!
//! End-to-end flows through the registry and prefix services, the way a
//! chat connector would drive them.

#[cfg(test)]
mod tests {
    use crate::Harness;
    use tag_registry::{
        Actor, ActorId, Claim, ConflictKind, DenialReason, RegistryError, ScopeId, TagPrefixApi,
        TagRegistryApi, ValidationError,
    };

    const G: ScopeId = ScopeId(1_000);
    const OTHER: ScopeId = ScopeId(2_000);

    // =============================================================================
    // CREATE / RESOLVE
    // =============================================================================

    #[tokio::test]
    async fn test_create_then_resolve_any_case() -> anyhow::Result<()> {
        let h = Harness::new();
        let a = h.member(G, 1, &[Claim::TagAdd]);
        let b = h.member(G, 2, &[Claim::TagAdd]);

        h.registry.create(G, "welcome", "Hi!", &a).await?;

        let found = h.registry.resolve(G, "WELCOME", false).await?;
        assert_eq!(found.content, "Hi!");
        assert_eq!(found.owner_id, Some(a.id));

        assert_eq!(
            h.registry.create(G, "welcome", "Hello", &b).await,
            Err(RegistryError::Conflict(ConflictKind::NameTaken))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_scopes_do_not_share_tags() -> anyhow::Result<()> {
        let h = Harness::new();
        let a = h.member(G, 1, &[Claim::TagAdd]);
        h.member(OTHER, 1, &[Claim::TagAdd]);

        h.registry.create(G, "faq", "in G", &a).await?;
        h.registry.create(OTHER, "faq", "elsewhere", &a).await?;

        assert_eq!(h.registry.resolve(G, "faq", false).await?.content, "in G");
        assert_eq!(
            h.registry.resolve(OTHER, "faq", false).await?.content,
            "elsewhere"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_ambiguous_fuzzy_lookup_never_resolves() -> anyhow::Result<()> {
        let h = Harness::new();
        let a = h.member(G, 1, &[Claim::TagAdd]);
        h.registry.create(G, "cat", "meow", &a).await?;
        h.registry.create(G, "car", "vroom", &a).await?;

        match h.registry.invoke(G, "caz", &a).await {
            Err(RegistryError::NotFound { suggestions, .. }) => {
                let mut names: Vec<_> = suggestions.into_iter().map(|t| t.name).collect();
                names.sort();
                assert_eq!(names, vec!["car", "cat"]);
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
        // Nothing was counted
        assert_eq!(h.registry.resolve(G, "cat", false).await?.use_count, 0);
        assert_eq!(h.registry.resolve(G, "car", false).await?.use_count, 0);
        Ok(())
    }

    // =============================================================================
    // CONTENT POLICY
    // =============================================================================

    #[tokio::test]
    async fn test_line_limit_scenario() -> anyhow::Result<()> {
        let h = Harness::new();
        let content = (1..=11).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");

        let member = h.member(G, 1, &[Claim::TagAdd]);
        assert!(matches!(
            h.registry.create(G, "steps", &content, &member).await,
            Err(RegistryError::Validation(ValidationError::LineLimitExceeded { lines: 11, max: 10 }))
        ));

        h.directory.join(G, ActorId(2));
        h.directory.grant(G, ActorId(2), &[Claim::TagAdd]);
        let admin = Actor::privileged(2);
        let tag = h.registry.create(G, "steps", &content, &admin).await?;
        assert_eq!(tag.content.lines().count(), 11);
        Ok(())
    }

    #[tokio::test]
    async fn test_content_limit_applies_to_privileged() {
        let h = Harness::new();
        h.directory.join(G, ActorId(2));
        h.directory.grant(G, ActorId(2), &[Claim::TagAdd]);
        let admin = Actor::privileged(2);

        let result = h.registry.create(G, "big", &"x".repeat(1001), &admin).await;
        assert!(matches!(
            result,
            Err(RegistryError::Validation(ValidationError::ContentTooLong { .. }))
        ));
    }

    #[tokio::test]
    async fn test_edit_keeps_mentions_neutralized() -> anyhow::Result<()> {
        let h = Harness::new();
        let a = h.member(G, 1, &[Claim::TagAdd]);
        h.registry.create(G, "ping", "hello", &a).await?;

        let edited = h
            .registry
            .edit(G, "ping", "@here and <@!123456789012345678>", &a)
            .await?;
        assert!(!edited.content.contains("@here"));
        assert!(edited.content.contains("@\u{200b}here"));
        Ok(())
    }

    // =============================================================================
    // OWNERSHIP LIFECYCLE
    // =============================================================================

    #[tokio::test]
    async fn test_vacant_tag_claim_scenario() -> anyhow::Result<()> {
        let h = Harness::new();
        let a = h.member(G, 1, &[Claim::TagAdd]);
        // Baseline members: tag_add only
        let c = h.member(G, 3, &[Claim::TagAdd]);
        let d = h.member(G, 4, &[Claim::TagAdd]);

        h.registry.create(G, "foo", "bar", &a).await?;
        h.directory.leave(G, a.id);

        let unclaimed = h.registry.list_unclaimed(G).await?;
        assert_eq!(unclaimed.len(), 1);
        assert_eq!(unclaimed[0].name, "foo");

        let claimed = h.registry.claim(G, "foo", &c).await?;
        assert_eq!(claimed.owner_id, Some(c.id));

        assert_eq!(
            h.registry.claim(G, "foo", &d).await,
            Err(RegistryError::AlreadyOwned { owner: c.id })
        );
        assert!(h.registry.list_unclaimed(G).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_owner_rejoining_makes_tag_owned_again() -> anyhow::Result<()> {
        let h = Harness::new();
        let a = h.member(G, 1, &[Claim::TagAdd]);
        h.registry.create(G, "foo", "bar", &a).await?;

        h.directory.leave(G, a.id);
        assert!(h.registry.info(G, "foo").await?.is_unclaimed());

        h.directory.join(G, a.id);
        assert_eq!(h.registry.info(G, "foo").await?.owner, Some(a.id));
        Ok(())
    }

    #[tokio::test]
    async fn test_transfer_then_edit_rights_move() -> anyhow::Result<()> {
        let h = Harness::new();
        let a = h.member(G, 1, &[Claim::TagAdd]);
        let b = h.member(G, 2, &[]);
        h.registry.create(G, "faq", "v1", &a).await?;

        h.registry.transfer(G, "faq", &a, &b).await?;

        assert_eq!(
            h.registry.edit(G, "faq", "v2", &a).await,
            Err(RegistryError::Denied(DenialReason::NotOwner))
        );
        assert_eq!(h.registry.edit(G, "faq", "v2", &b).await?.content, "v2");
        assert_eq!(h.registry.list_owned(G, b.id).await?.len(), 1);
        assert!(h.registry.list_owned(G, a.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_transfer_to_automated_always_fails() -> anyhow::Result<()> {
        let h = Harness::new();
        let a = h.member(G, 1, &[Claim::TagAdd]);
        let admin = h.member(G, 2, &Claim::ALL);
        h.registry.create(G, "faq", "v1", &a).await?;

        let bot = Actor::automated(42);
        for from in [&a, &admin] {
            assert_eq!(
                h.registry.transfer(G, "faq", from, &bot).await,
                Err(RegistryError::InvalidRecipient { recipient: bot.id })
            );
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_moderator_delete_and_suggestions_after() -> anyhow::Result<()> {
        let h = Harness::new();
        let a = h.member(G, 1, &[Claim::TagAdd]);
        let moderator = h.member(G, 9, &[Claim::TagDelete]);
        h.registry.create(G, "rules", "be nice", &a).await?;
        h.registry.create(G, "rules2", "be kind", &a).await?;

        let deleted = h.registry.delete(G, "rules", &moderator).await?;
        assert_eq!(deleted.name, "rules");

        match h.registry.edit(G, "rules", "x", &a).await {
            Err(RegistryError::NotFound { suggestions, .. }) => {
                assert_eq!(suggestions[0].name, "rules2");
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
        Ok(())
    }

    // =============================================================================
    // LISTINGS
    // =============================================================================

    #[tokio::test]
    async fn test_listing_pages() -> anyhow::Result<()> {
        let h = Harness::new();
        let a = h.member(G, 1, &[Claim::TagAdd]);
        for i in 0..25 {
            h.registry.create(G, &format!("tag{:02}", i), "x", &a).await?;
        }
        h.registry.invoke(G, "tag24", &a).await?;

        let tags = h.registry.list(G).await?;
        let pages = h.registry.paginate(&tags);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].items[0].name, "tag24");
        assert_eq!(pages[0].items[1].name, "tag00");
        assert_eq!(pages[2].items.len(), 1);
        assert!(pages.iter().all(|p| p.total == 3));
        Ok(())
    }

    // =============================================================================
    // PREFIX
    // =============================================================================

    #[tokio::test]
    async fn test_prefix_and_inline_invocation() -> anyhow::Result<()> {
        let h = Harness::new();
        let a = h.member(G, 1, &[Claim::TagAdd, Claim::CustomTagPrefixSet]);
        h.registry.create(G, "faq", "answers", &a).await?;

        h.prefix_service.set_prefix(G, "!", &a).await?;
        assert_eq!(h.prefix_service.get_prefix(G).await?, "!");
        assert_eq!(h.prefix_service.get_prefix(OTHER).await?, "$");

        let names = h
            .prefix_service
            .invocations(G, "read !FAQ, then `!ignored` and !faq again")
            .await?;
        assert_eq!(names, vec!["faq"]);

        for name in names {
            assert_eq!(h.registry.invoke(G, &name, &a).await?.use_count, 1);
        }
        Ok(())
    }
}
