use actix_web::dev::Payload;
use actix_web::{Error, FromRequest, HttpRequest, HttpResponse, web};
use common::config::FlashConfig;
use futures::future::{Ready, ready};
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

/// 重定向地址上携带 flash 令牌的参数名
pub const FLASH_PARAM: &str = "flash";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlashMessage {
    pub message: String,
}

/// 按类别（如 `info`）分组的一次性提示
pub type FlashBag = BTreeMap<String, Vec<FlashMessage>>;

/// 服务端一次性提示存储：写入时生成令牌随重定向带给下一个页面，
/// 页面读取后即删除，过期未读的自动丢弃
pub struct FlashStore {
    cache: Cache<String, FlashBag>,
}

impl FlashStore {
    pub fn new(ttl_secs: u64, max_capacity: u64) -> Self {
        let cache = Cache::builder().time_to_live(Duration::from_secs(ttl_secs)).max_capacity(max_capacity).build();
        Self { cache }
    }

    pub fn from_config(config: &FlashConfig) -> Self {
        Self::new(config.ttl_secs, config.max_capacity)
    }

    /// 保存一条提示，返回读取用的令牌
    pub fn push(&self, category: &str, message: impl Into<String>) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let mut bag = FlashBag::new();
        bag.insert(category.to_string(), vec![FlashMessage { message: message.into() }]);
        self.cache.insert(token.clone(), bag);
        token
    }

    /// 取出并删除，同一令牌只能读取一次；过期的令牌取不到
    pub fn take(&self, token: &str) -> Option<FlashBag> {
        self.cache.get(token)?;
        self.cache.remove(token)
    }

    /// 写入提示并重定向，令牌附加在目标地址的查询参数上
    pub fn redirect(&self, location: &str, category: &str, message: impl Into<String>) -> HttpResponse {
        let token = self.push(category, message);
        crate::result::redirect(&format!("{}?{}={}", location, FLASH_PARAM, token))
    }
}

#[derive(Debug, Deserialize)]
struct FlashQuery {
    flash: Option<String>,
}

/// 当前页面要展示的提示，由请求里的 flash 令牌取出
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(transparent)]
pub struct FlashMessages(pub FlashBag);

impl FlashMessages {
    pub fn get(&self, category: &str) -> &[FlashMessage] {
        self.0.get(category).map(Vec::as_slice).unwrap_or_default()
    }
}

impl FromRequest for FlashMessages {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = web::Query::<FlashQuery>::from_query(req.query_string())
            .ok()
            .and_then(|q| q.into_inner().flash);
        let bag = match (req.app_data::<web::Data<FlashStore>>(), token) {
            (Some(store), Some(token)) => store.take(&token).unwrap_or_default(),
            _ => FlashBag::new(),
        };
        ready(Ok(FlashMessages(bag)))
    }
}
