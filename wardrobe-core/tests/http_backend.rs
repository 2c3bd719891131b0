use serde_json::json;
use wardrobe_core::{
    BackendError, FeedbackPayload, FeedbackRating, FeedbackView, FlowError, GarmentCategory,
    HttpBackend, ItemDraft, ItemUpload, SuggestionFlow, WardrobeBackend, load_item_image,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, body_string_contains, header, header_regex, method, path},
};

fn suggestion_body() -> serde_json::Value {
    json!({
        "clima": {
            "cidade": "Juiz de Fora",
            "temperatura": 18,
            "umidade": 75,
            "vento": 11.2,
            "condicao": "parcialmente nublado",
            "visibilidade": 10
        },
        "score": 16,
        "sugestao": [
            {"tipo": "top", "id": 3, "nome": "Camisa", "cor": "azul", "imagem_path": null},
            {"tipo": "bottom", "id": 7, "nome": "Calça", "cor": "preta", "imagem_path": "calca.png"}
        ],
        "detalhes": {"recomendacao": "Camadas leves"}
    })
}

#[tokio::test]
async fn juiz_de_fora_scenario_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/sugestao"))
        .and(body_json(json!({"cidade": "Juiz de Fora"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(suggestion_body()))
        .expect(1)
        .mount(&server)
        .await;

    let mut flow = SuggestionFlow::new(HttpBackend::new(server.uri()), "Juiz de Fora");
    flow.activate().await.expect("suggestion should load");

    let view = flow.view();
    let result = view.result.expect("suggestion rendered");
    assert_eq!(result.confidence, 80);
    assert_eq!(result.headline, "Outfit perfeito para 18°C em Juiz de Fora");
    assert_eq!(result.explanation, "Camadas leves");
    assert_eq!(result.weather.humidity, 75);

    let order: Vec<_> = result.pieces.iter().map(|(c, _)| *c).collect();
    assert_eq!(order, vec![GarmentCategory::Top, GarmentCategory::Bottom]);
    assert_eq!(result.pieces[1].1.image.as_deref(), Some("calca.png"));
}

#[tokio::test]
async fn backend_error_body_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/sugestao"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"erro": "cidade não encontrada"})))
        .mount(&server)
        .await;

    let mut flow = SuggestionFlow::new(HttpBackend::new(server.uri()), "Juiz de Fora");
    flow.set_city("Atlantis");
    let err = flow.request_suggestion().await.unwrap_err();

    assert_eq!(err, FlowError::Request("cidade não encontrada".into()));
    let view = flow.view();
    assert_eq!(view.error.as_deref(), Some("cidade não encontrada"));
    assert!(!view.loading);
    assert!(view.result.is_none());
}

#[tokio::test]
async fn empty_wardrobe_message_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/sugestao"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "erro": "Nenhuma roupa encontrada no guarda-roupa",
            "sugestao": null,
            "score": 0,
            "detalhes": {}
        })))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    assert_eq!(
        backend.fetch_suggestion("Juiz de Fora").await.unwrap_err(),
        BackendError::api(200, Some("Nenhuma roupa encontrada no guarda-roupa".into()))
    );

    let mut flow = SuggestionFlow::new(backend, "Juiz de Fora");
    let err = flow.request_suggestion().await.unwrap_err();

    assert_eq!(err, FlowError::Request("Nenhuma roupa encontrada no guarda-roupa".into()));
    let view = flow.view();
    assert!(!view.loading);
    assert!(view.result.is_none());
}

#[tokio::test]
async fn suggestion_with_weather_ignores_stray_error_key() {
    let server = MockServer::start().await;

    let mut body = suggestion_body();
    body["erro"] = json!("aviso");
    Mock::given(method("POST"))
        .and(path("/api/sugestao"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let payload = HttpBackend::new(server.uri())
        .fetch_suggestion("Juiz de Fora")
        .await
        .expect("weather present, so the answer decodes");
    assert_eq!(payload.weather.temperature, 18);
}

#[tokio::test]
async fn error_key_variants_and_plain_bodies() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/roupas"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "db locked"})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/roupas/1"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());

    assert_eq!(
        backend.list_items().await.unwrap_err(),
        BackendError::api(500, Some("db locked".into()))
    );
    assert_eq!(backend.delete_item(1).await.unwrap_err(), BackendError::api(502, None));
}

#[tokio::test]
async fn blank_city_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/sugestao"))
        .respond_with(ResponseTemplate::new(200).set_body_json(suggestion_body()))
        .expect(0)
        .mount(&server)
        .await;

    let mut flow = SuggestionFlow::new(HttpBackend::new(server.uri()), "Juiz de Fora");
    flow.set_city("   ");

    assert!(matches!(flow.request_suggestion().await, Err(FlowError::Validation(_))));
}

#[tokio::test]
async fn unreachable_backend_reports_connection_error() {
    // Nothing listens on port 9 (discard) in the test environment.
    let mut flow = SuggestionFlow::new(HttpBackend::new("http://127.0.0.1:9"), "Juiz de Fora");

    let err = flow.request_suggestion().await.unwrap_err();

    assert_eq!(err, FlowError::Request("Erro de conexão com o servidor".into()));
    assert!(!flow.is_loading());
}

#[tokio::test]
async fn feedback_is_posted_and_failures_are_ignored() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/sugestao"))
        .respond_with(ResponseTemplate::new(200).set_body_json(suggestion_body()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/feedback"))
        .and(body_json(json!({
            "cidade": "Juiz de Fora",
            "temperatura": 18,
            "tipo_feedback": "neutro",
            "score": 3
        })))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut flow = SuggestionFlow::new(HttpBackend::new(server.uri()), "Juiz de Fora");
    flow.activate().await.expect("suggestion should load");

    let rating = flow.submit_feedback(3).await.expect("failure is swallowed");

    let view = flow.view();
    assert_eq!(view.error, None);
    assert_eq!(view.result.expect("rendered").feedback, FeedbackView::Thanked(rating));
}

#[tokio::test]
async fn submit_feedback_directly() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/feedback"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let rating = FeedbackRating::new(5).expect("valid rating");
    backend
        .submit_feedback(&FeedbackPayload::new("Recife", 30, rating))
        .await
        .expect("feedback accepted");
}

#[tokio::test]
async fn create_without_upload_sends_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/roupas"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "nome": "Jaqueta",
            "tipo": "casaco",
            "cor": "verde",
            "temperatura_min": 0,
            "temperatura_max": 15,
            "imagem_path": "jaqueta.png"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 11,
            "nome": "Jaqueta",
            "tipo": "casaco",
            "cor": "verde",
            "ocasiao": null,
            "temperatura_min": 0,
            "temperatura_max": 15,
            "imagem": "jaqueta.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let draft = ItemDraft {
        name: Some("Jaqueta".into()),
        category: Some("casaco".into()),
        color: Some("verde".into()),
        min_temperature: Some(0),
        max_temperature: Some(15),
        image_path: Some("jaqueta.png".into()),
        upload: None,
    };

    let item = HttpBackend::new(server.uri()).create_item(&draft).await.expect("created");
    assert_eq!(item.id, 11);
    assert_eq!(item.garment_category(), Some(GarmentCategory::Outerwear));
    assert_eq!(item.image.as_deref(), Some("jaqueta.png"));
}

#[tokio::test]
async fn update_with_upload_sends_multipart() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/roupas/4"))
        .and(header_regex("content-type", "^multipart/form-data"))
        .and(body_string_contains("name=\"cor\""))
        .and(body_string_contains("name=\"imagem\"; filename=\"bota.png\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 4,
            "nome": "Bota",
            "tipo": "calçado",
            "cor": "marrom",
            "temperatura_min": 5,
            "temperatura_max": 20,
            "imagem": "abc123.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let draft = ItemDraft {
        color: Some("marrom".into()),
        upload: Some(ItemUpload { file_name: "bota.png".into(), bytes: b"PNGDATA".to_vec() }),
        ..Default::default()
    };

    let item = HttpBackend::new(server.uri()).update_item(4, &draft).await.expect("updated");
    assert_eq!(item.image.as_deref(), Some("abc123.png"));
}

#[tokio::test]
async fn list_and_delete_items() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/roupas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "nome": "Camisa", "tipo": "superior", "cor": "azul", "temperatura_min": 15, "temperatura_max": 30, "imagem": null},
            {"id": 2, "nome": "Tênis", "tipo": "calçado", "cor": "branco", "temperatura_min": null, "temperatura_max": null, "imagem": ""}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/roupas/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"mensagem": "Roupa deletada com sucesso"})))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());

    let items = backend.list_items().await.expect("listed");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].min_temperature, Some(15));
    assert_eq!(items[1].garment_category(), Some(GarmentCategory::Footwear));

    backend.delete_item(2).await.expect("deleted");
}

#[tokio::test]
async fn list_tolerates_form_posted_temperatures() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/roupas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "nome": "Camiseta", "tipo": "superior", "cor": "branca", "temperatura_min": "", "temperatura_max": "25"},
            {"id": 2, "nome": "Casaco", "tipo": "casaco", "cor": "cinza", "temperatura_min": 5, "temperatura_max": 18}
        ])))
        .mount(&server)
        .await;

    let items = HttpBackend::new(server.uri()).list_items().await.expect("listed");

    assert_eq!(items[0].min_temperature, None);
    assert_eq!(items[0].max_temperature, Some(25));
    assert_eq!(items[1].max_temperature, Some(18));
}

#[tokio::test]
async fn upload_image_returns_stored_name() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload-imagem"))
        .and(body_string_contains("name=\"file\"; filename=\"camisa.jpg\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mensagem": "Upload realizado com sucesso",
            "filename": "0f1e2d.jpg"
        })))
        .mount(&server)
        .await;

    let upload = ItemUpload { file_name: "camisa.jpg".into(), bytes: b"JPEGDATA".to_vec() };
    let name = HttpBackend::new(server.uri()).upload_image(&upload).await.expect("uploaded");
    assert_eq!(name, "0f1e2d.jpg");
}

#[tokio::test]
async fn image_loading_falls_back_to_file_route() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/image/5"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Imagem não encontrada"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/imagens/calca.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"IMG".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());

    let bytes = load_item_image(&backend, Some(5), Some("calca.png")).await;
    assert_eq!(bytes.as_deref(), Some(&b"IMG"[..]));
}

#[tokio::test]
async fn image_loading_gives_up_without_file_name() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/image/6"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    assert_eq!(load_item_image(&backend, Some(6), None).await, None);
    assert_eq!(load_item_image(&backend, None, Some("  ")).await, None);
}
