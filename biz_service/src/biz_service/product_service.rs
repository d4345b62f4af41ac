use crate::entitys::category_entity::{CATEGORY_COLLECTION, CategoryEntity};
use crate::entitys::product_entity::{NewProduct, PRODUCT_COLLECTION, PopulatedProduct, ProductEntity};
use crate::entitys::tag_entity::{TAG_COLLECTION, TagEntity};
use common::DocId;
use common::errors::AppError;
use common::query_builder::QueryBuilder;
use common::repository_util::{BaseRepository, COUNTER_COLLECTION, FindSpec, Repository};
use common::util::date_util::now;
use jieba_rs::Jieba;
use log::{debug, info};
use mongodb::Database;
use mongodb::bson::{Document, doc};
use once_cell::sync::Lazy;
use std::collections::BTreeSet;
use std::sync::Arc;

/// 产品关联查询条件，未指定的项使用 [`Default`] 中的取值
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQueryOptions {
    /// 产品返回字段
    pub p_select: String,
    /// 分类返回字段
    pub c_select: String,
    /// 标签返回字段
    pub t_select: String,
    /// 产品过滤条件
    pub p_options: Document,
    /// 分类关联条件
    pub c_options: Document,
    /// 标签关联条件
    pub t_options: Document,
    /// 分类、标签排序
    pub c_t_sort: Document,
    /// 产品排序
    pub p_sort: Document,
}

impl Default for ProductQueryOptions {
    fn default() -> Self {
        Self {
            p_select: "_id pid cid code skPic description price title lastModifyTime tags".to_string(),
            c_select: "reid tag title".to_string(),
            t_select: "reid tag title".to_string(),
            p_options: doc! { "_id": { "$gt": 0 }, "isVisible": true },
            c_options: doc! { "rank": 2, "isVisible": true },
            t_options: doc! { "rank": 2, "isVisible": true },
            c_t_sort: doc! { "sort": -1 },
            p_sort: doc! { "lastModifyTime": -1 },
        }
    }
}

pub struct ProductService {
    pub dao: Arc<dyn Repository<ProductEntity>>,
    pub category_dao: Arc<dyn Repository<CategoryEntity>>,
    pub tag_dao: Arc<dyn Repository<TagEntity>>,
}

impl ProductService {
    pub fn new(db: &Database) -> Self {
        let counters = db.collection::<Document>(COUNTER_COLLECTION);
        Self {
            dao: Arc::new(BaseRepository::<ProductEntity>::new(db.collection(PRODUCT_COLLECTION), counters.clone())),
            category_dao: Arc::new(BaseRepository::<CategoryEntity>::new(db.collection(CATEGORY_COLLECTION), counters.clone())),
            tag_dao: Arc::new(BaseRepository::<TagEntity>::new(db.collection(TAG_COLLECTION), counters)),
        }
    }

    /// 可见产品数量；`pid` 为空或 0 时统计全部分类
    pub async fn get_product_count(&self, pid: Option<DocId>) -> Result<u64, AppError> {
        let filter = QueryBuilder::new().eq_if_truthy("pid", pid).eq("isVisible", true).build();
        self.dao.count(filter).await
    }

    pub async fn get_product_by_id(&self, id: DocId) -> Result<Option<ProductEntity>, AppError> {
        self.dao.find_by_id(id).await
    }

    /// 按分类查询；`cid` 为空或 0 时返回全部产品
    pub async fn get_product_by_type(&self, cid: Option<DocId>) -> Result<Vec<ProductEntity>, AppError> {
        let filter = QueryBuilder::new().eq_if_truthy("cid", cid).build();
        self.dao.find(filter, FindSpec::new()).await
    }

    /// 查询产品并关联分类与标签。
    ///
    /// 分类、标签两次关联查询并发执行，全部完成后才组装结果；
    /// 结果顺序与产品查询的排序一致。
    pub async fn get_products(&self, options: ProductQueryOptions) -> Result<Vec<PopulatedProduct>, AppError> {
        let products = self
            .dao
            .find(options.p_options, FindSpec::new().select(&options.p_select).sort(options.p_sort))
            .await?;
        if products.is_empty() {
            return Ok(vec![]);
        }

        let category_ids: BTreeSet<DocId> = products.iter().map(|p| p.cid).collect();
        let tag_ids: BTreeSet<DocId> = products.iter().flat_map(|p| p.tags.iter().copied()).collect();
        let category_filter = QueryBuilder::new()
            .in_array("_id", category_ids.into_iter().collect::<Vec<DocId>>())
            .and()
            .overlay(options.c_options)
            .build();
        let tag_filter = QueryBuilder::new()
            .in_array("_id", tag_ids.into_iter().collect::<Vec<DocId>>())
            .and()
            .overlay(options.t_options)
            .build();

        let (categories, tags) = futures::try_join!(
            self.category_dao.find(category_filter, FindSpec::new().select(&options.c_select).sort(options.c_t_sort.clone())),
            self.tag_dao.find(tag_filter, FindSpec::new().select(&options.t_select).sort(options.c_t_sort)),
        )?;
        debug!("populated {} products with {} categories, {} tags", products.len(), categories.len(), tags.len());

        Ok(products
            .into_iter()
            .map(|product| {
                let category = categories.iter().find(|c| c.id == product.cid).cloned();
                let tag_list = tags.iter().filter(|t| product.tags.contains(&t.id)).cloned().collect();
                PopulatedProduct { product, category, tag_list }
            })
            .collect())
    }

    /// 分页查询可见产品，`page_index` 从 1 开始。
    ///
    /// 调用方的 `options` 覆盖基础条件 `{_id: {$gt: 0}, isVisible: true}` 中的同名字段。
    pub async fn get_products_by_page(
        &self,
        select: &str,
        page_index: i64,
        page_size: i64,
        options: Document,
    ) -> Result<Vec<ProductEntity>, AppError> {
        let skip = page_index.saturating_sub(1).saturating_mul(page_size).max(0) as u64;
        let filter = QueryBuilder::new().gt("_id", 0).eq("isVisible", true).overlay(options).build();
        self.dao
            .find(filter, FindSpec::new().select(select).skip(skip).limit(page_size))
            .await
    }

    pub async fn new_and_save(&self, params: NewProduct) -> Result<ProductEntity, AppError> {
        let now = now();
        let product = ProductEntity {
            id: self.dao.next_id().await?,
            pid: params.pid,
            cid: params.cid,
            tags: params.tags,
            search: search_terms(&params.title),
            title: params.title,
            content: params.content,
            price: params.price,
            description: params.description,
            slider_pics: params.slider_pics,
            sk_pic: params.sk_pic,
            code: params.code,
            count: params.count,
            is_visible: params.is_visible,
            sort: 0,
            create_time: Some(now),
            last_modify_time: Some(now),
        };
        self.dao.insert(&product).await?;
        info!("product {} ({}) created", product.id, product.code);
        Ok(product)
    }
}

static JIEBA: Lazy<Jieba> = Lazy::new(Jieba::new);

/// 标题分词：按空白和标点切成词，含中文的词再交给 jieba 细分；结果转小写并去重
pub fn search_terms(title: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in title.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let pieces = if word.chars().any(is_han) { JIEBA.cut(word, true) } else { vec![word] };
        for piece in pieces {
            let term = piece.trim().to_lowercase();
            if !term.is_empty() && !terms.contains(&term) {
                terms.push(term);
            }
        }
    }
    terms
}

fn is_han(c: char) -> bool {
    matches!(c, '\u{3400}'..='\u{4DBF}' | '\u{4E00}'..='\u{9FFF}' | '\u{F900}'..='\u{FAFF}')
}
