use maveli::bot::{TurnOrchestrator, TurnOutcome};
use maveli::channels::{Channel, InboundMessage, Sender, TelegramChannel};
use maveli::knowledge::{KnowledgeAugmenter, WikipediaClient};
use maveli::persona::Persona;
use maveli::providers::{GeminiClient, ModelClient, build_client};
use maveli::responder::Responder;
use maveli::speech::{GoogleTranslateTts, SpeechSynthesizer};
use maveli::storage::ConversationStore;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "123:TEST";
const REPLY: &str = "ഓണാശംസകൾ മക്കളെ! എന്റെ നാട്ടിൽ എല്ലാവരും സന്തോഷത്തോടെ ജീവിച്ചു.";

struct Services {
    gemini: MockServer,
    tts: MockServer,
    telegram: MockServer,
    wiki: MockServer,
}

impl Services {
    async fn start() -> Self {
        Self {
            gemini: MockServer::start().await,
            tts: MockServer::start().await,
            telegram: MockServer::start().await,
            wiki: MockServer::start().await,
        }
    }

    async fn mount_gemini_reply(&self, text: &str) {
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": text }] },
                    "finishReason": "STOP"
                }]
            })))
            .mount(&self.gemini)
            .await;
    }

    async fn mount_telegram_ok(&self) {
        Mock::given(method("POST"))
            .and(path_regex(r"^/bot123:TEST/(sendMessage|sendVoice|sendChatAction)$"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": true })),
            )
            .mount(&self.telegram)
            .await;
    }

    fn orchestrator(&self, store: Arc<ConversationStore>, with_speech: bool) -> TurnOrchestrator {
        let client = build_client(10, None);
        let persona = Arc::new(Persona::maveli());

        let model: Arc<dyn ModelClient> = Arc::new(GeminiClient::new(
            "AIzaTEST",
            "gemini-test",
            &self.gemini.uri(),
            client.clone(),
        ));
        let wiki = Arc::new(WikipediaClient::new(&self.wiki.uri(), client.clone()).unwrap());
        let knowledge = KnowledgeAugmenter::new(wiki.clone(), wiki);
        let responder = Responder::new(
            model,
            Arc::clone(&store),
            Some(knowledge),
            Arc::clone(&persona),
            3,
        );
        let speech = with_speech.then(|| {
            SpeechSynthesizer::new(Arc::new(GoogleTranslateTts::new(
                &self.tts.uri(),
                "ml",
                true,
                client.clone(),
            )))
        });
        let channel: Arc<dyn Channel> = Arc::new(TelegramChannel::new(
            TOKEN.to_string(),
            &self.telegram.uri(),
            client,
        ));

        TurnOrchestrator::new(
            channel,
            responder,
            speech,
            store,
            persona,
            Some(1),
            Duration::from_secs(10),
        )
    }

    async fn telegram_calls(&self, name: &str) -> Vec<wiremock::Request> {
        self.telegram
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path().ends_with(name))
            .collect()
    }
}

async fn file_store(dir: &TempDir) -> Arc<ConversationStore> {
    Arc::new(
        ConversationStore::connect(&dir.path().join("maveli.db"))
            .await
            .expect("store should open"),
    )
}

fn message(text: &str) -> InboundMessage {
    InboundMessage {
        message_id: 501,
        chat_id: 77,
        sender: Sender {
            id: 77,
            username: Some("anu".into()),
            first_name: Some("Anu".into()),
            last_name: None,
        },
        text: text.to_string(),
    }
}

#[tokio::test]
async fn hello_turn_goes_out_as_voice_and_is_stored() {
    let services = Services::start().await;
    services.mount_gemini_reply(REPLY).await;
    services.mount_telegram_ok().await;
    Mock::given(method("GET"))
        .and(path("/translate_tts"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mpeg")
                .set_body_bytes(b"ID3fake".to_vec()),
        )
        .mount(&services.tts)
        .await;

    let dir = TempDir::new().unwrap();
    let store = file_store(&dir).await;
    let orchestrator = services.orchestrator(Arc::clone(&store), true);

    let outcome = orchestrator.handle(&message("Hello")).await;
    assert_eq!(outcome, TurnOutcome::Delivered { voice: true });

    let voices = services.telegram_calls("sendVoice").await;
    assert_eq!(voices.len(), 1);
    let body = String::from_utf8_lossy(&voices[0].body);
    assert!(body.contains("name=\"voice\""));
    assert!(body.contains("ID3fake"));
    assert!(body.contains("501"));
    assert!(services.telegram_calls("sendMessage").await.is_empty());

    // "Hello" carries no encyclopedia trigger.
    assert!(services.wiki.received_requests().await.unwrap_or_default().is_empty());

    let prompt: Value = serde_json::from_slice(
        &services.gemini.received_requests().await.unwrap()[0].body,
    )
    .unwrap();
    let prompt_text = prompt["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt_text.contains("Hello"));
    assert!(prompt_text.contains(&Persona::maveli().script));

    let history = store.get_history(77, 5).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].user_message, "Hello");
    assert_eq!(history[0].bot_response, REPLY);
    assert!(history[0].audio_generated);

    let stats = orchestrator.stats();
    let stats = stats.lock().unwrap();
    assert_eq!(stats.audio_generations, 1);
    assert_eq!(stats.successful_responses, 1);
}

#[tokio::test]
async fn tts_outage_degrades_to_text_reply() {
    let services = Services::start().await;
    services.mount_gemini_reply(REPLY).await;
    services.mount_telegram_ok().await;
    Mock::given(method("GET"))
        .and(path("/translate_tts"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&services.tts)
        .await;

    let dir = TempDir::new().unwrap();
    let store = file_store(&dir).await;
    let orchestrator = services.orchestrator(Arc::clone(&store), true);

    let outcome = orchestrator.handle(&message("Hello")).await;
    assert_eq!(outcome, TurnOutcome::Delivered { voice: false });

    let texts = services.telegram_calls("sendMessage").await;
    assert_eq!(texts.len(), 1);
    let body: Value = serde_json::from_slice(&texts[0].body).unwrap();
    assert_eq!(body["text"], REPLY);
    assert_eq!(body["reply_to_message_id"], 501);
    assert!(!store.get_history(77, 1).await[0].audio_generated);
}

#[tokio::test]
async fn model_outage_sends_fallback_from_pool() {
    let services = Services::start().await;
    services.mount_telegram_ok().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
        .mount(&services.gemini)
        .await;

    let dir = TempDir::new().unwrap();
    let store = file_store(&dir).await;
    let orchestrator = services.orchestrator(Arc::clone(&store), false);

    orchestrator.handle(&message("Hello")).await;

    let texts = services.telegram_calls("sendMessage").await;
    let body: Value = serde_json::from_slice(&texts[0].body).unwrap();
    let sent = body["text"].as_str().unwrap();
    assert!(Persona::maveli().fallback_replies.iter().any(|r| r == sent));

    let stats = orchestrator.stats();
    assert_eq!(stats.lock().unwrap().failed_responses, 0);
}

#[tokio::test]
async fn kerala_question_pulls_encyclopedia_snippet_into_prompt() {
    let services = Services::start().await;
    services.mount_gemini_reply(REPLY).await;
    services.mount_telegram_ok().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/rest_v1/page/summary/.+"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "കേരളം",
            "extract": "കേരളം ഇന്ത്യയുടെ തെക്കേ അറ്റത്തുള്ള സംസ്ഥാനമാണ്."
        })))
        .mount(&services.wiki)
        .await;

    let dir = TempDir::new().unwrap();
    let store = file_store(&dir).await;
    let orchestrator = services.orchestrator(store, false);

    orchestrator.handle(&message("കേരളം")).await;

    let requests = services.gemini.received_requests().await.unwrap();
    let prompt = String::from_utf8_lossy(&requests[0].body);
    assert!(prompt.contains("തെക്കേ അറ്റത്തുള്ള സംസ്ഥാനമാണ്"));
}

#[tokio::test]
async fn telegram_rejection_fails_turn() {
    let services = Services::start().await;
    services.mount_gemini_reply(REPLY).await;
    Mock::given(method("POST"))
        .and(path("/bot123:TEST/sendMessage"))
        .and(body_string_contains("chat_id"))
        .respond_with(ResponseTemplate::new(403).set_body_string("bot was blocked by the user"))
        .mount(&services.telegram)
        .await;
    Mock::given(method("POST"))
        .and(path("/bot123:TEST/sendChatAction"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&services.telegram)
        .await;

    let dir = TempDir::new().unwrap();
    let store = file_store(&dir).await;
    let orchestrator = services.orchestrator(Arc::clone(&store), false);

    let outcome = orchestrator.handle(&message("Hello")).await;
    assert_eq!(outcome, TurnOutcome::Failed);
    // The reply and the apology were both attempted.
    assert_eq!(services.telegram_calls("sendMessage").await.len(), 2);
    assert!(store.get_history(77, 1).await.is_empty());
}
