use askama::Template;
use askama_web::WebTemplate;

#[derive(Template, WebTemplate)]
#[template(path = "map.html")]
pub struct MapTemplate {
    pub refresh_ms: u64,
    pub trail_length: usize,
}
