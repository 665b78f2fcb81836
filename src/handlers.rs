use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, PoisonError, RwLock};

use iron::headers::{AccessControlAllowOrigin, ContentType};
use iron::prelude::Chain;
use iron::{status, AfterMiddleware, Handler, IronError, IronResult, Request, Response};
use log::info;
use router::{NoRoute, Router};
use rustc_serialize::json::{Json, Object, ToJson};
use url::form_urlencoded;

use crate::error::StoreError;
use crate::model::{PostDraft, PostPatch};
use crate::store::PostStore;

/// Match a `Result` into its inner value or return a JSON error response.
/// A `StoreError` picks its own status; any other error needs one passed
/// as the second argument.
macro_rules! try_handler {
    ( $e:expr ) => {
        match $e {
            Ok(x) => x,
            Err(e) => return Ok(store_error(&e)),
        }
    };
    ( $e:expr, $status:expr ) => {
        match $e {
            Ok(x) => x,
            Err(e) => return Ok(json_error($status, &e.to_string())),
        }
    };
}

/// Take the shared side of the store lock. Store operations leave the
/// collection valid even when they fail, so a poisoned lock is recovered.
macro_rules! read_lock {
    ( $e:expr ) => {
        $e.read().unwrap_or_else(PoisonError::into_inner)
    };
}

/// Take the exclusive side of the store lock.
macro_rules! write_lock {
    ( $e:expr ) => {
        $e.write().unwrap_or_else(PoisonError::into_inner)
    };
}

/// Get the post id from the URI.
/// A missing or non-numeric id does not name a post: `404 Not Found`.
macro_rules! get_post_id {
    ( $r:expr ) => {
        match $r.extensions.get::<Router>().and_then(|params| params.find("id")) {
            Some(val) => match val.parse::<u32>() {
                Ok(id) => id,
                Err(_) => return Ok(not_found()),
            },
            None => return Ok(not_found()),
        }
    };
}

pub type SharedStore = Arc<RwLock<PostStore>>;

pub struct Handlers {
    pub list: ListHandler,
    pub create: CreateHandler,
    pub delete: DeleteHandler,
    pub update: UpdateHandler,
    pub search: SearchHandler,
}

impl Handlers {
    pub fn new(store: PostStore) -> Handlers {
        let store = Arc::new(RwLock::new(store));
        Handlers {
            list: ListHandler { store: store.clone() },
            create: CreateHandler { store: store.clone() },
            delete: DeleteHandler { store: store.clone() },
            update: UpdateHandler { store: store.clone() },
            search: SearchHandler { store },
        }
    }
}

/// Routes every post operation and wraps the router in the JSON
/// middleware. Request logging is linked by the binary.
pub fn app(store: PostStore) -> Chain {
    let handlers = Handlers::new(store);

    let mut router = Router::new();
    router.get("/api/posts", handlers.list, "list_posts");
    router.post("/api/posts", handlers.create, "create_post");
    router.get("/api/posts/search", handlers.search, "search_posts");
    router.put("/api/posts/:id", handlers.update, "update_post");
    router.delete("/api/posts/:id", handlers.delete, "delete_post");
    router.options("/api/posts", PreflightHandler, "preflight_posts");
    router.options("/api/posts/:id", PreflightHandler, "preflight_post");

    router.put("/api/posts", MethodNotAllowedHandler, "posts_put");
    router.delete("/api/posts", MethodNotAllowedHandler, "posts_delete");
    router.patch("/api/posts", MethodNotAllowedHandler, "posts_patch");
    router.get("/api/posts/:id", MethodNotAllowedHandler, "post_get");
    router.post("/api/posts/:id", MethodNotAllowedHandler, "post_post");
    router.patch("/api/posts/:id", MethodNotAllowedHandler, "post_patch");

    let mut chain = Chain::new(router);
    chain.link_after(JsonAfterMiddleware);
    chain
}

pub struct ListHandler {
    store: SharedStore,
}

impl Handler for ListHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let params = query_params(req.url.query());
        let posts = try_handler!(read_lock!(self.store).list(
            params.get("sort").map(String::as_str),
            params.get("direction").map(String::as_str),
        ));
        Ok(json_response(status::Ok, &posts.to_json()))
    }
}

pub struct CreateHandler {
    store: SharedStore,
}

impl Handler for CreateHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let object = try_handler!(read_object(req), status::BadRequest);
        let post = try_handler!(write_lock!(self.store).create(PostDraft::from_json(&object)));
        info!("post {} created", post.id());
        Ok(json_response(status::Created, &post.to_json()))
    }
}

pub struct DeleteHandler {
    store: SharedStore,
}

impl Handler for DeleteHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let id = get_post_id!(req);
        let post = try_handler!(write_lock!(self.store).delete(id));
        info!("post {} deleted", post.id());
        let message = format!("Post with id {} has been deleted successfully.", post.id());
        Ok(json_response(status::Ok, &json_object("message", &message)))
    }
}

pub struct UpdateHandler {
    store: SharedStore,
}

impl Handler for UpdateHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let id = get_post_id!(req);
        if read_lock!(self.store).get(id).is_none() {
            return Ok(store_error(&StoreError::NotFound(id)));
        }
        let object = try_handler!(read_object(req), status::BadRequest);
        let post = try_handler!(write_lock!(self.store).update(id, PostPatch::from_json(&object)));
        Ok(json_response(status::Ok, &post.to_json()))
    }
}

pub struct SearchHandler {
    store: SharedStore,
}

impl Handler for SearchHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let params = query_params(req.url.query());
        let posts = read_lock!(self.store).search(
            params.get("title").map(String::as_str),
            params.get("content").map(String::as_str),
        );
        Ok(json_response(status::Ok, &posts.to_json()))
    }
}

/// Answers CORS preflight requests for the post routes.
pub struct PreflightHandler;

impl Handler for PreflightHandler {
    fn handle(&self, _: &mut Request) -> IronResult<Response> {
        let mut res = Response::with(status::Ok);
        res.headers.set_raw("Access-Control-Allow-Methods", vec![b"GET, POST, PUT, DELETE, OPTIONS".to_vec()]);
        res.headers.set_raw("Access-Control-Allow-Headers", vec![b"Content-Type".to_vec()]);
        Ok(res)
    }
}

/// A known post route hit with a method it does not serve.
pub struct MethodNotAllowedHandler;

impl Handler for MethodNotAllowedHandler {
    fn handle(&self, _: &mut Request) -> IronResult<Response> {
        Ok(json_error(status::MethodNotAllowed, "Method Not Allowed"))
    }
}

/// Marks every response as JSON and opens it to any origin. Unmatched
/// routes become a JSON `404`.
pub struct JsonAfterMiddleware;

impl AfterMiddleware for JsonAfterMiddleware {
    fn after(&self, _: &mut Request, mut res: Response) -> IronResult<Response> {
        set_json_headers(&mut res);
        Ok(res)
    }

    fn catch(&self, _: &mut Request, mut err: IronError) -> IronResult<Response> {
        if err.error.is::<NoRoute>() {
            let mut res = not_found();
            set_json_headers(&mut res);
            return Ok(res);
        }
        set_json_headers(&mut err.response);
        Err(err)
    }
}

fn set_json_headers(res: &mut Response) {
    res.headers.set(ContentType::json());
    res.headers.set(AccessControlAllowOrigin::Any);
}

/// Decode a query string. The first value of a repeated key wins.
pub fn query_params(query: Option<&str>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    if let Some(query) = query {
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            params.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }
    }
    params
}

fn read_object(req: &mut Request) -> Result<Object, String> {
    let mut payload = String::new();
    req.body.read_to_string(&mut payload).map_err(|e| e.to_string())?;
    decode_object(&payload)
}

pub fn decode_object(payload: &str) -> Result<Object, String> {
    match Json::from_str(payload) {
        Ok(Json::Object(object)) => Ok(object),
        Ok(_) => Err("Expected a JSON object.".to_string()),
        Err(e) => Err(format!("Invalid JSON: {}", e)),
    }
}

pub fn status_for(err: &StoreError) -> status::Status {
    match *err {
        StoreError::Validation(_) | StoreError::InvalidParameter | StoreError::DuplicateId(_) => status::BadRequest,
        StoreError::NotFound(_) => status::NotFound,
        StoreError::OutOfIdentifiers => status::ServiceUnavailable,
    }
}

fn store_error(err: &StoreError) -> Response {
    json_error(status_for(err), &err.to_string())
}

fn not_found() -> Response {
    json_error(status::NotFound, "Not Found")
}

fn json_error(status: status::Status, message: &str) -> Response {
    json_response(status, &json_object("error", message))
}

fn json_object(key: &str, value: &str) -> Json {
    let mut object = Object::new();
    object.insert(key.to_string(), Json::String(value.to_string()));
    Json::Object(object)
}

fn json_response(status: status::Status, body: &Json) -> Response {
    Response::with((status, body.to_string()))
}
