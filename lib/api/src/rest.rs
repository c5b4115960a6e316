use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use aqlx_core::{CollectionConfig, DocId, Document, QueryEngine, QueryOptions, SortSpec};
use aqlx_storage::{StorageManager, DEFAULT_LIMIT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Deserialize)]
struct CreateCollectionRequest {
    #[serde(default)]
    default_limit: Option<usize>,
}

#[derive(Serialize)]
struct CollectionInfo {
    name: String,
    documents_count: usize,
    fields_count: usize,
    default_limit: usize,
}

#[derive(Deserialize)]
struct UpsertDocumentsRequest {
    documents: Vec<DocumentRequest>,
}

#[derive(Deserialize)]
struct DocumentRequest {
    #[serde(default)]
    id: Option<serde_json::Value>,
    body: serde_json::Value,
}

#[derive(Deserialize)]
struct QueryRequest {
    session_id: String,
    text: String,
    #[serde(default)]
    offset: usize,
    #[serde(default)]
    sort: Option<SortSpec>,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(storage: Arc<StorageManager>, port: u16) -> std::io::Result<()> {
        let engine = Arc::new(QueryEngine::new());
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(storage.clone()))
                .app_data(web::Data::new(engine.clone()))
                .route("/collections", web::get().to(list_collections))
                .route("/collections/{name}", web::get().to(get_collection))
                .route("/collections/{name}", web::put().to(create_collection))
                .route("/collections/{name}", web::delete().to(delete_collection))
                .route("/collections/{name}/documents", web::put().to(upsert_documents))
                .route("/collections/{name}/fields", web::get().to(list_fields))
                .route("/collections/{name}/query", web::post().to(query_collection))
                .route("/sessions/{session_id}/reset", web::post().to(reset_session))
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

async fn list_collections(storage: web::Data<Arc<StorageManager>>) -> ActixResult<HttpResponse> {
    let collections = storage.list_collections();
    Ok(HttpResponse::Ok().json(collections))
}

async fn get_collection(
    storage: web::Data<Arc<StorageManager>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let name = path.into_inner();

    if let Some(collection) = storage.get_collection(&name) {
        let info = CollectionInfo {
            name: collection.name().to_string(),
            documents_count: collection.count(),
            fields_count: collection.schema().len(),
            default_limit: collection.default_limit(),
        };
        Ok(HttpResponse::Ok().json(info))
    } else {
        Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Collection not found"
        })))
    }
}

async fn create_collection(
    storage: web::Data<Arc<StorageManager>>,
    path: web::Path<String>,
    req: web::Json<CreateCollectionRequest>,
) -> ActixResult<HttpResponse> {
    let name = path.into_inner();

    let config = CollectionConfig {
        name,
        default_limit: req.default_limit.unwrap_or(DEFAULT_LIMIT),
    };

    match storage.create_collection(config) {
        Ok(_) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "result": true
        }))),
        Err(e) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": e.to_string()
        }))),
    }
}

async fn delete_collection(
    storage: web::Data<Arc<StorageManager>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let name = path.into_inner();

    match storage.delete_collection(&name) {
        Ok(true) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "result": true
        }))),
        Ok(false) => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Collection not found"
        }))),
        Err(e) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": e.to_string()
        }))),
    }
}

async fn upsert_documents(
    storage: web::Data<Arc<StorageManager>>,
    path: web::Path<String>,
    req: web::Json<UpsertDocumentsRequest>,
) -> ActixResult<HttpResponse> {
    let name = path.into_inner();

    let collection = match storage.get_collection(&name) {
        Some(c) => c,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "error": "Collection not found"
            })));
        }
    };

    let documents: Result<Vec<Document>, &str> = req
        .documents
        .iter()
        .map(|doc_req| {
            let id = match &doc_req.id {
                Some(serde_json::Value::String(s)) => DocId::String(s.clone()),
                Some(serde_json::Value::Number(n)) => match n.as_u64() {
                    Some(u) => DocId::Integer(u),
                    None => return Err("Invalid document ID"),
                },
                Some(_) => return Err("Invalid document ID"),
                None => DocId::Uuid(Uuid::new_v4()),
            };
            Ok(Document::new(id, doc_req.body.clone()))
        })
        .collect();

    match documents {
        Ok(documents) => {
            if let Err(e) = collection.batch_upsert(documents) {
                return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                    "error": e.to_string()
                })));
            }
        }
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": e
            })));
        }
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "result": true
    })))
}

async fn list_fields(
    storage: web::Data<Arc<StorageManager>>,
    engine: web::Data<Arc<QueryEngine>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let name = path.into_inner();

    let collection = match storage.get_collection(&name) {
        Some(c) => c,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "error": "Collection not found"
            })));
        }
    };

    let snapshot = engine.rebuild_schema(&collection);
    Ok(HttpResponse::Ok().json(snapshot.fields()))
}

async fn query_collection(
    storage: web::Data<Arc<StorageManager>>,
    engine: web::Data<Arc<QueryEngine>>,
    path: web::Path<String>,
    req: web::Json<QueryRequest>,
) -> ActixResult<HttpResponse> {
    let name = path.into_inner();

    let collection = match storage.get_collection(&name) {
        Some(c) => c,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "error": "Collection not found"
            })));
        }
    };

    let options = QueryOptions {
        offset: req.offset,
        order_by: req.sort.clone(),
    };
    match engine.translate_and_execute_with(
        storage.sessions(),
        &collection,
        &req.session_id,
        &req.text,
        options,
    ) {
        Ok(response) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "aql": response.aql,
            "results": response.results,
            "diagnostics": response.diagnostics,
        }))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": e.to_string()
        }))),
    }
}

async fn reset_session(
    storage: web::Data<Arc<StorageManager>>,
    engine: web::Data<Arc<QueryEngine>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let session_id = path.into_inner();
    engine.reset(storage.sessions(), &session_id);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "result": true
    })))
}
