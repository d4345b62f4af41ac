use crate::flash::FlashMessages;
use actix_web::body::BoxBody;
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, Responder};
use serde_json::Value;

/// 后台页面的默认布局
pub const ADMIN_LAYOUT: &str = "admin";

/// 待渲染的页面：模板名、布局和模板数据，以 JSON 交给模板层渲染
#[derive(Debug)]
pub struct View {
    template: &'static str,
    layout: Option<&'static str>,
    data: Value,
    messages: FlashMessages,
}

impl View {
    pub fn new(template: &'static str) -> Self {
        Self { template, layout: None, data: Value::Object(Default::default()), messages: FlashMessages::default() }
    }

    pub fn layout(mut self, layout: &'static str) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn messages(mut self, messages: FlashMessages) -> Self {
        self.messages = messages;
        self
    }
}

impl Responder for View {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        HttpResponse::Ok().json(serde_json::json!({
            "template": self.template,
            "layout": self.layout,
            "data": self.data,
            "messages": self.messages,
        }))
    }
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found().insert_header((header::LOCATION, location)).finish()
}
