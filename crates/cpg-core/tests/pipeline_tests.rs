use cpg_core::{ContentPlanPipeline, GenerationError, PipelineConfig};
use cpg_model::{AccountContext, AccountType, DataBasis, OverallStatus, Platform};
use cpg_storage::{BlobStore, FsBlobStore, MemoryBlobStore};
use cpg_test_utils::{
    hinton_store, raw_posts, seed_competitor, seed_primary, ScriptedGenerator,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn hinton_context() -> AccountContext {
    AccountContext::new("geoffreyhinton", Platform::Twitter)
        .with_competitors(["elonmusk", "ylecun", "sama"])
        .with_account_type(AccountType::NonBranding)
}

fn pipeline(
    store: Arc<dyn BlobStore>,
    generator: Arc<ScriptedGenerator>,
    max_retries: u32,
) -> ContentPlanPipeline {
    ContentPlanPipeline::new(
        PipelineConfig::default().with_max_retries(max_retries),
        store,
        generator,
    )
}

#[tokio::test]
async fn hardcoded_hashtag_forces_a_second_attempt() {
    let store = Arc::new(hinton_store());
    let generator = Arc::new(ScriptedGenerator::new().with(
        "next_post_prediction",
        Ok(json!({
            "caption": "Thoughts on the future of neural networks",
            "hashtags": ["#geoffreyhintonlove"],
            "image_prompt": "A chalkboard covered in backpropagation equations",
            "call_to_action": "Tell me what worries you most"
        })),
    ));

    let outcome = pipeline(store.clone(), generator.clone(), 3)
        .run_pipeline(hinton_context())
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.attempts_used, 2);
    assert_eq!(outcome.reports.len(), 2);
    assert!(outcome.reports[0]
        .issues
        .contains(&"NEXT_POST: HARDCODED HASHTAG DETECTED: #geoffreyhintonlove (generic pattern)".to_string()));
    assert!(outcome.reports[1].passed);

    // attempt 2 regenerated every module instead of replaying a cached response
    let next_post_calls = generator.calls_for("next_post_prediction");
    assert_eq!(next_post_calls.len(), 2);
    assert_eq!(generator.call_count(), 2 * 6);
    let feedback = &next_post_calls[1].prompt_context["correction_feedback"];
    assert_eq!(feedback["attempt"], json!(1));
    assert!(next_post_calls[0].prompt_context.get("correction_feedback").is_none());

    let stored = store
        .get_json("content_plans/twitter/geoffreyhinton/content_plan.json")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored["validation"]["overall_status"], json!("VERIFIED"));
    assert_eq!(stored["validation"]["attempts_used"], json!(2));
    assert_eq!(stored["competitor_analysis"].as_object().unwrap().len(), 3);
}

#[tokio::test]
async fn identity_fields_match_context_on_every_attempt() {
    let generator = Arc::new(ScriptedGenerator::new());
    for _ in 0..3 {
        generator.push(
            "improvement_recommendations",
            Ok(json!({ "recommendations": ["only one"] })),
        );
    }

    let ctx = hinton_context();
    let outcome = pipeline(Arc::new(hinton_store()), generator.clone(), 3)
        .run_pipeline(ctx.clone())
        .await
        .unwrap();

    assert!(outcome.is_exhausted());
    assert_eq!(outcome.attempts_used, 3);
    for call in generator.calls() {
        assert_eq!(call.prompt_context["primary_username"], json!("geoffreyhinton"));
        assert_eq!(call.prompt_context["platform"], json!("twitter"));
        assert_eq!(call.prompt_context["competitors"], json!(ctx.competitors));
    }
    let plan = outcome.plan.unwrap();
    assert_eq!(plan.primary_username, ctx.primary_username);
    assert_eq!(plan.platform, ctx.platform);
    assert_eq!(plan.competitors, ctx.competitors);
}

#[tokio::test]
async fn exhausted_budget_is_persisted_as_failed() {
    let generator = Arc::new(ScriptedGenerator::new());
    for _ in 0..2 {
        generator.push(
            "recommendation",
            Err(GenerationError::Unavailable("rate limited".into())),
        );
    }
    let store = Arc::new(hinton_store());

    let outcome = pipeline(store.clone(), generator, 2)
        .run_pipeline(hinton_context())
        .await
        .unwrap();

    assert!(!outcome.success);
    assert!(!outcome.skip_export);
    assert_eq!(outcome.attempts_used, 2);
    assert_eq!(outcome.issues, outcome.reports[1].issues);
    assert!(outcome
        .issues
        .iter()
        .any(|i| i.starts_with("PLACEHOLDER: recommendation")));

    let plan = outcome.plan.unwrap();
    let validation = plan.validation.unwrap();
    assert_eq!(validation.overall_status, OverallStatus::Failed);
    assert_eq!(validation.issues, outcome.issues);
    assert!(store.contains("content_plans/twitter/geoffreyhinton/content_plan.json"));
}

#[tokio::test]
async fn zero_primary_posts_with_competitor_data_builds_competitor_only_plan() {
    let store = MemoryBlobStore::new();
    seed_competitor(
        &store,
        Platform::Instagram,
        "newbrand",
        "glossier",
        &["Summer skin care routine", "New glow collection"],
    );
    let ctx = AccountContext::new("newbrand", Platform::Instagram)
        .with_competitors(["glossier", "rarebeauty"]);
    let generator = Arc::new(ScriptedGenerator::new());

    let outcome = pipeline(Arc::new(store), generator.clone(), 3)
        .run_pipeline(ctx)
        .await
        .unwrap();

    assert!(!outcome.skip_export);
    assert!(outcome.success);
    assert_eq!(outcome.data_basis, Some(DataBasis::CompetitorsOnly));
    let plan = outcome.plan.unwrap();
    assert!(plan.warning.is_some());
    assert_eq!(plan.competitor_analysis.len(), 2);
    assert_eq!(
        plan.competitor_analysis["glossier"].data_source.as_deref(),
        Some("instagram/newbrand/glossier.json")
    );
    assert_eq!(
        generator.calls()[0].prompt_context["data_basis"],
        json!("competitors_only")
    );
}

#[tokio::test]
async fn no_data_anywhere_skips_export_and_writes_nothing() {
    let store = Arc::new(MemoryBlobStore::new());
    let generator = Arc::new(ScriptedGenerator::new());
    let ctx = AccountContext::new("ghost", Platform::Facebook).with_competitors(["phantom"]);

    let outcome = pipeline(store.clone(), generator.clone(), 3)
        .run_pipeline(ctx)
        .await
        .unwrap();

    assert!(outcome.skip_export);
    assert!(!outcome.success);
    assert!(!outcome.is_exhausted());
    assert_eq!(outcome.attempts_used, 0);
    assert_eq!(generator.call_count(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn competitor_found_only_in_flat_layout_is_used() {
    let store = MemoryBlobStore::new();
    seed_primary(&store, Platform::Twitter, "geoffreyhinton", &["Neural nets #AI"]);
    store.insert("twitter/sama.json", raw_posts("sama", &["Compute is destiny #tech"]));
    let ctx = AccountContext::new("geoffreyhinton", Platform::Twitter)
        .with_competitors(["sama"])
        .with_account_type(AccountType::NonBranding);

    let outcome = pipeline(Arc::new(store), Arc::new(ScriptedGenerator::new()), 1)
        .run_pipeline(ctx)
        .await
        .unwrap();

    assert!(outcome.success);
    let plan = outcome.plan.unwrap();
    assert_eq!(
        plan.competitor_analysis["sama"].data_source.as_deref(),
        Some("twitter/sama.json")
    );
}

#[tokio::test]
async fn process_reads_account_info_and_exports_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let fs = FsBlobStore::new(dir.path());
    fs.put_json(
        "AccountInfo/fentybeauty/info.json",
        &json!({
            "username": "fentybeauty",
            "accountType": "",
            "postingStyle": "bold and inclusive",
            "competitors": ["toofaced"],
            "platform": "instagram"
        }),
    )
    .await
    .unwrap();
    fs.put_json(
        "instagram/fentybeauty/fentybeauty.json",
        &json!([{
            "username": "fentybeauty",
            "biography": "Official beauty brand. Shop worldwide.",
            "latestPosts": [
                { "id": "f1", "caption": "New gloss drop #beauty", "likesCount": 900, "commentsCount": 40 }
            ]
        }]),
    )
    .await
    .unwrap();
    fs.put_json(
        "instagram/fentybeauty/toofaced.json",
        &raw_posts("toofaced", &["Peach palette is back #makeup"]),
    )
    .await
    .unwrap();

    let store: Arc<dyn BlobStore> = Arc::new(fs);
    let generator = Arc::new(ScriptedGenerator::new());
    let outcome = pipeline(store.clone(), generator, 3)
        .process("fentybeauty")
        .await
        .unwrap();

    assert!(outcome.success);
    let path = outcome.plan_path.clone().unwrap();
    assert_eq!(path, "content_plans/instagram/fentybeauty/content_plan.json");
    assert!(dir.path().join(&path).exists());

    let plan = outcome.plan.unwrap();
    assert_eq!(plan.account_type, AccountType::Branding);
    assert_eq!(plan.posting_style.as_deref(), Some("bold and inclusive"));
}

#[tokio::test]
async fn batch_continues_past_a_failing_account() {
    let store = Arc::new(hinton_store());
    store.insert(
        "AccountInfo/geoffreyhinton/info.json",
        json!({ "username": "geoffreyhinton", "platform": "twitter", "accountType": "personal" }),
    );
    let p = pipeline(store, Arc::new(ScriptedGenerator::new()), 1);

    let results = p
        .process_many(&["missing".to_string(), "geoffreyhinton".to_string()])
        .await;

    assert_eq!(results.len(), 2);
    assert!(results[0].1.is_err());
    assert!(results[1].1.as_ref().unwrap().success);
}
