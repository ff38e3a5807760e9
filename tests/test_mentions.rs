//! Mention suggestion strategies exercised through the service.

use std::sync::Arc;

use araliya_knowledge::subsystems::knowledge::stores::tmp::TmpStore;
use araliya_knowledge::subsystems::knowledge::types::SuggestionPayload;
use araliya_knowledge::subsystems::knowledge::{
    Agent, DocumentType, KnowledgeService, MentionKind, Registry, ServiceOptions,
};

fn agents() -> Vec<Agent> {
    vec![
        Agent::new("planner", "Planner", "Breaks work into steps"),
        Agent::new("coder", "Coder", "Writes and fixes code"),
        Agent::new("critic", "Critic", "Reviews drafts"),
    ]
}

async fn fixture() -> (KnowledgeService, Vec<String>) {
    let svc = KnowledgeService::new(
        Arc::new(TmpStore::new()),
        Registry::with_agents(agents()),
        ServiceOptions::for_user("alice"),
    );
    let mut ids = Vec::new();
    for (title, body) in [
        ("Residential building code", "Setbacks and heights"),
        ("Travel policy", "Economy fares only"),
        ("Incident report", "Outage on Tuesday"),
    ] {
        let doc = svc
            .create_document(title, body, DocumentType::Reference, vec![])
            .await
            .unwrap();
        ids.push(doc.id);
    }
    (svc, ids)
}

#[tokio::test]
async fn agent_prefix_returns_every_agent() {
    let (svc, _) = fixture().await;
    let out = svc.get_mention_suggestions("@agent/");
    assert_eq!(out.len(), 3);
    for (s, a) in out.iter().zip(agents()) {
        assert_eq!(s.kind, MentionKind::Agent);
        assert_eq!(s.label, format!("agent/{}", a.name));
        assert_eq!(s.path, format!("@agent/{}", a.id));
    }
}

#[tokio::test]
async fn knowledge_prefix_searches_index() {
    let (svc, ids) = fixture().await;

    let all = svc.get_mention_suggestions("@knowledge/");
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].id, ids[0]);

    let hits = svc.get_mention_suggestions("@knowledge/travel");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, ids[1]);
    assert!(matches!(
        hits[0].payload,
        Some(SuggestionPayload::Document { version: 1, .. })
    ));
}

#[tokio::test]
async fn unknown_prefix_gets_category_menu() {
    let (svc, _) = fixture().await;
    let menu = svc.get_mention_suggestions("@");
    let paths: Vec<_> = menu.iter().map(|s| s.path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["@agent/", "@skill/", "@tool/", "@knowledge/", "@seamstress/"]
    );
    assert!(svc.get_mention_suggestions("plain text").is_empty());
}

#[tokio::test]
async fn flat_empty_query_balances_categories() {
    let (svc, ids) = fixture().await;
    let out = svc.get_simple_mention_suggestions("");

    let kinds: Vec<_> = out.iter().take(12).map(|s| s.kind).collect();
    assert_eq!(&kinds[0..3], &[MentionKind::Agent; 3]);
    assert_eq!(&kinds[3..6], &[MentionKind::Skill; 3]);
    assert_eq!(&kinds[6..9], &[MentionKind::Tool; 3]);
    assert_eq!(&kinds[9..12], &[MentionKind::Knowledge; 3]);

    assert_eq!(out[0].id, "planner");
    let doc_ids: Vec<_> = out[9..12].iter().map(|s| s.id.clone()).collect();
    assert_eq!(doc_ids, ids);
}

#[tokio::test]
async fn flat_query_prefers_prefix_then_type() {
    let (svc, _) = fixture().await;
    let out = svc.get_simple_mention_suggestions("to");
    assert!(out.len() <= 15);

    // every tool label starts with "tool/"
    let prefixed: Vec<_> = out
        .iter()
        .take_while(|s| s.label.to_lowercase().starts_with("to"))
        .collect();
    assert_eq!(prefixed.len(), 5);
    assert!(prefixed.iter().all(|s| s.kind == MentionKind::Tool));
    let labels: Vec<_> = prefixed.iter().map(|s| s.label.to_lowercase()).collect();
    let mut sorted = labels.clone();
    sorted.sort();
    assert_eq!(labels, sorted);

    // the rest match elsewhere ("into", "to the") and follow type priority
    let rest = &out[prefixed.len()..];
    assert!(!rest.is_empty());
    assert!(rest.iter().all(|s| !s.label.to_lowercase().starts_with("to")));
    let priorities: Vec<_> = rest.iter().map(|s| s.kind.priority()).collect();
    let mut ordered = priorities.clone();
    ordered.sort();
    assert_eq!(priorities, ordered);
    assert_eq!(rest[0].kind, MentionKind::Agent);
}

#[tokio::test]
async fn zero_matches_is_empty() {
    let (svc, _) = fixture().await;
    assert!(svc.get_simple_mention_suggestions("qqqqzz").is_empty());
    assert!(svc.get_mention_suggestions("@agent/qqqqzz").is_empty());
    assert!(svc.get_mention_suggestions("@knowledge/qqqqzz").is_empty());
}
