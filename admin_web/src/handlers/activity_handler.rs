use crate::flash::{FlashMessages, FlashStore};
use crate::result::{ADMIN_LAYOUT, View};
use actix_web::{Responder, get, post, web};
use biz_service::biz_service::activity_service::{ActivityParams, ActivityService};
use biz_service::entitys::activity_entity::ActivityEntity;
use common::DocId;
use common::errors::AppError;
use common::util::date_util::{parse_form_time, time_to_str};
use mongodb::bson::doc;
use serde::{Deserialize, Serialize};

/// 活动变更后的返回页面
pub const ACTIVITY_LIST_PATH: &str = "/admin/activity_list";
/// 列表页只取这些字段
const LIST_SELECT: &str = "_id title startTime endTime isVisible";

const MSG_ADDED: &str = "添加成功";
const MSG_EDITED: &str = "编辑成功";
const MSG_REMOVED: &str = "删除成功";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(activity_list);
    cfg.service(activity_add_page);
    cfg.service(activity_add);
    cfg.service(activity_edit_page);
    cfg.service(activity_edit);
    cfg.service(activity_remove);
}

/// 新增 / 编辑表单，字段不做校验，原样交给存储层
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ActivityForm {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub title: Option<String>,
    pub is_visible: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub pic: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
}

impl ActivityForm {
    fn to_params(&self) -> ActivityParams {
        ActivityParams {
            title: self.title.clone().unwrap_or_default(),
            is_visible: is_checked(self.is_visible.as_deref()),
            start_time: parse_form_time(self.start_time.as_deref()),
            end_time: parse_form_time(self.end_time.as_deref()),
            pic: self.pic.clone().unwrap_or_default(),
            description: self.description.clone().unwrap_or_default(),
            content: self.content.clone().unwrap_or_default(),
        }
    }

    fn activity_id(&self) -> Result<DocId, AppError> {
        let raw = self.id.as_deref().unwrap_or_default().trim();
        raw.parse().map_err(|_| AppError::Validation(format!("invalid _id: {:?}", raw)))
    }
}

/// 复选框 / 下拉框提交的显示开关
fn is_checked(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("1" | "true" | "on" | "yes"))
}

/// 页面展示用的活动，时间格式化为 `%Y-%m-%d %H:%M:%S`，无效时间为 null
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityView {
    #[serde(rename = "_id")]
    pub id: DocId,
    pub title: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub is_visible: bool,
    pub pic: String,
    pub description: String,
    pub content: String,
}

impl From<ActivityEntity> for ActivityView {
    fn from(activity: ActivityEntity) -> Self {
        Self {
            id: activity.id,
            title: activity.title,
            start_time: activity.start_time.map(time_to_str),
            end_time: activity.end_time.map(time_to_str),
            is_visible: activity.is_visible,
            pic: activity.pic,
            description: activity.description,
            content: activity.content,
        }
    }
}

#[get("/activity_list")]
pub async fn activity_list(
    activity_service: web::Data<ActivityService>,
    messages: FlashMessages,
) -> Result<impl Responder, AppError> {
    let list: Vec<ActivityView> = activity_service
        .get(doc! {}, LIST_SELECT)
        .await?
        .into_iter()
        .map(ActivityView::from)
        .collect();
    Ok(View::new("admin/activity_list")
        .layout(ADMIN_LAYOUT)
        .data(serde_json::json!({ "list": list }))
        .messages(messages))
}

#[get("/activity_add")]
pub async fn activity_add_page(messages: FlashMessages) -> impl Responder {
    View::new("admin/activity_add").layout(ADMIN_LAYOUT).messages(messages)
}

#[post("/activity_add")]
pub async fn activity_add(
    form: web::Form<ActivityForm>,
    activity_service: web::Data<ActivityService>,
    flash: web::Data<FlashStore>,
) -> Result<impl Responder, AppError> {
    activity_service.create(form.to_params()).await?;
    Ok(flash.redirect(ACTIVITY_LIST_PATH, "info", MSG_ADDED))
}

#[get("/activity_edit/{_id}")]
pub async fn activity_edit_page(
    id: web::Path<DocId>,
    activity_service: web::Data<ActivityService>,
    messages: FlashMessages,
) -> Result<impl Responder, AppError> {
    let model = activity_service.get_by_id(id.into_inner()).await?.ok_or(AppError::NotFound)?;
    Ok(View::new("admin/activity_edit")
        .layout(ADMIN_LAYOUT)
        .data(serde_json::json!({ "model": ActivityView::from(model) }))
        .messages(messages))
}

#[post("/activity_edit")]
pub async fn activity_edit(
    form: web::Form<ActivityForm>,
    activity_service: web::Data<ActivityService>,
    flash: web::Data<FlashStore>,
) -> Result<impl Responder, AppError> {
    let id = form.activity_id()?;
    activity_service.update(id, form.to_params()).await?;
    Ok(flash.redirect(ACTIVITY_LIST_PATH, "info", MSG_EDITED))
}

/// 删除完成后才重定向，删除失败返回错误
#[get("/activity_remove/{_id}")]
pub async fn activity_remove(
    id: web::Path<DocId>,
    activity_service: web::Data<ActivityService>,
    flash: web::Data<FlashStore>,
) -> Result<impl Responder, AppError> {
    activity_service.remove(id.into_inner()).await?;
    Ok(flash.redirect(ACTIVITY_LIST_PATH, "info", MSG_REMOVED))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers;
    use actix_web::dev::ServiceResponse;
    use actix_web::http::{StatusCode, header};
    use actix_web::{App, test};
    use common::memory_repository::MemoryRepository;
    use serde_json::Value;
    use std::sync::Arc;

    struct Harness {
        repo: Arc<MemoryRepository<ActivityEntity>>,
        service: web::Data<ActivityService>,
        flash: web::Data<FlashStore>,
    }

    fn harness() -> Harness {
        let repo = Arc::new(MemoryRepository::<ActivityEntity>::new());
        let service = web::Data::new(ActivityService::with_repository(repo.clone()));
        let flash = web::Data::new(FlashStore::new(60, 100));
        Harness { repo, service, flash }
    }

    macro_rules! app {
        ($h:expr) => {
            test::init_service(
                App::new()
                    .app_data($h.service.clone())
                    .app_data($h.flash.clone())
                    .configure(handlers::configure),
            )
            .await
        };
    }

    fn location(resp: &ServiceResponse) -> String {
        resp.headers().get(header::LOCATION).unwrap().to_str().unwrap().to_string()
    }

    fn spring_sale_form() -> Vec<(&'static str, &'static str)> {
        vec![
            ("title", "Spring Sale"),
            ("isVisible", "1"),
            ("startTime", "2024-03-01 08:00:00"),
            ("endTime", "2024-03-31 20:00:00"),
            ("pic", "/upload/spring.png"),
            ("description", "spring"),
            ("content", "<p>sale</p>"),
        ]
    }

    async fn seed(h: &Harness, title: &str, is_visible: bool) -> ActivityEntity {
        let params = ActivityParams { title: title.to_string(), is_visible, ..Default::default() };
        h.service.create(params).await.unwrap()
    }

    #[actix_web::test]
    async fn test_add_then_list() {
        let h = harness();
        let app = app!(h);

        let req = test::TestRequest::post().uri("/admin/activity_add").set_form(spring_sale_form()).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        let target = location(&resp);
        assert!(target.starts_with("/admin/activity_list?flash="));

        let req = test::TestRequest::get().uri(&target).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["template"], "admin/activity_list");
        assert_eq!(body["layout"], "admin");
        assert_eq!(body["messages"]["info"][0]["message"], "添加成功");
        let row = &body["data"]["list"][0];
        assert_eq!(row["title"], "Spring Sale");
        assert_eq!(row["startTime"], "2024-03-01 08:00:00");
        assert_eq!(row["endTime"], "2024-03-31 20:00:00");
        assert_eq!(row["isVisible"], true);
        // 列表不返回正文
        assert_eq!(row["content"], "");

        // 提示只展示一次
        let req = test::TestRequest::get().uri(&target).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["messages"], serde_json::json!({}));
    }

    #[actix_web::test]
    async fn test_list_includes_hidden_activities() {
        let h = harness();
        seed(&h, "Spring Sale", true).await;
        seed(&h, "Draft", false).await;
        let app = app!(h);

        let req = test::TestRequest::get().uri("/admin/activity_list").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let list = body["data"]["list"].as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["title"], "Spring Sale");
        assert_eq!(list[1]["title"], "Draft");
        assert_eq!(list[1]["isVisible"], false);
    }

    #[actix_web::test]
    async fn test_add_page() {
        let h = harness();
        let app = app!(h);
        let req = test::TestRequest::get().uri("/admin/activity_add").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["template"], "admin/activity_add");
        assert_eq!(h.repo.documents().await.len(), 0);
    }

    #[actix_web::test]
    async fn test_invalid_dates_are_accepted() {
        let h = harness();
        let app = app!(h);
        let form = vec![("title", "Odd dates"), ("startTime", "someday"), ("endTime", "")];
        let req = test::TestRequest::post().uri("/admin/activity_add").set_form(form).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);

        let req = test::TestRequest::get().uri("/admin/activity_list").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let row = &body["data"]["list"][0];
        assert_eq!(row["startTime"], Value::Null);
        assert_eq!(row["endTime"], Value::Null);
        assert_eq!(row["isVisible"], false);
    }

    #[actix_web::test]
    async fn test_edit_then_get() {
        let h = harness();
        let created = seed(&h, "Spring Sale", true).await;
        let app = app!(h);

        let id = created.id.to_string();
        let mut form: Vec<(&str, &str)> = spring_sale_form();
        form[0] = ("title", "Summer Sale");
        form.push(("_id", id.as_str()));
        let req = test::TestRequest::post().uri("/admin/activity_edit").set_form(form).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert!(location(&resp).starts_with(ACTIVITY_LIST_PATH));

        let req = test::TestRequest::get().uri(&format!("/admin/activity_edit/{}", created.id)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["template"], "admin/activity_edit");
        assert_eq!(body["data"]["model"]["title"], "Summer Sale");
        assert_eq!(body["data"]["model"]["content"], "<p>sale</p>");
    }

    #[actix_web::test]
    async fn test_edit_page_not_found() {
        let h = harness();
        let app = app!(h);
        let req = test::TestRequest::get().uri("/admin/activity_edit/404").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_edit_requires_numeric_id() {
        let h = harness();
        let app = app!(h);
        let form = vec![("_id", "abc"), ("title", "x")];
        let req = test::TestRequest::post().uri("/admin/activity_edit").set_form(form).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_remove() {
        let h = harness();
        let created = seed(&h, "Spring Sale", true).await;
        let app = app!(h);

        let req = test::TestRequest::get().uri(&format!("/admin/activity_remove/{}", created.id)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);

        let req = test::TestRequest::get().uri(&location(&resp)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["messages"]["info"][0]["message"], "删除成功");
        assert_eq!(body["data"]["list"].as_array().unwrap().len(), 0);
    }

    #[actix_web::test]
    async fn test_store_errors_are_forwarded() {
        let h = harness();
        let created = seed(&h, "Spring Sale", true).await;
        h.repo.set_failing(true);
        let app = app!(h);

        let req = test::TestRequest::get().uri("/admin/activity_list").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let req = test::TestRequest::post().uri("/admin/activity_add").set_form(spring_sale_form()).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let req = test::TestRequest::get().uri(&format!("/admin/activity_remove/{}", created.id)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[::core::prelude::v1::test]
    fn test_is_checked() {
        assert!(is_checked(Some("on")));
        assert!(is_checked(Some(" 1 ")));
        assert!(!is_checked(Some("0")));
        assert!(!is_checked(None));
    }
}
