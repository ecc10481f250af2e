use sea_orm::{Order, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::debug;
use uuid::Uuid;

use crate::{
    Category, CategoryKind, EngineError, ResultEngine, categories, transactions,
    util::{normalize_optional_text, normalize_required_name},
};

use super::{Engine, with_tx};

impl Engine {
    /// Return a category from DB.
    pub async fn category(&self, category_id: Uuid) -> ResultEngine<Category> {
        categories::Entity::find_by_id(category_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::not_found("category", category_id))
            .and_then(Category::try_from)
    }

    /// Return the categories sorted by name. Hidden ones only with
    /// `show_hidden`.
    pub async fn categories(&self, show_hidden: bool) -> ResultEngine<Vec<Category>> {
        let mut query = categories::Entity::find();
        if !show_hidden {
            query = query.filter(categories::Column::IsHidden.eq(false));
        }
        query
            .order_by(Expr::cust("LOWER(name)"), Order::Asc)
            .order_by_asc(categories::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }

    /// Add a new category.
    pub async fn new_category(
        &self,
        name: &str,
        kind: CategoryKind,
        note: Option<&str>,
    ) -> ResultEngine<Category> {
        let mut category = Category::new(normalize_required_name(name, "category")?, kind);
        category.note = normalize_optional_text(note)?;

        categories::ActiveModel::from(&category)
            .insert(&self.database)
            .await?;
        debug!(category_id = %category.id, name = %category.name, "category created");
        Ok(category)
    }

    /// Overwrite the stored category with `category`.
    pub async fn update_category(&self, category: &Category) -> ResultEngine<Category> {
        let mut category = category.clone();
        category.name = normalize_required_name(&category.name, "category")?;
        category.note = normalize_optional_text(category.note.as_deref())?;

        let result = categories::Entity::update_many()
            .set(categories::ActiveModel::from(&category))
            .filter(categories::Column::Id.eq(category.id.to_string()))
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::not_found("category", category.id));
        }
        debug!(category_id = %category.id, "category updated");
        Ok(category)
    }

    /// Delete a category.
    ///
    /// Its transactions move to `shift_to`, or lose their category when it is
    /// `None`. Returns the number of moved transactions.
    pub async fn remove_category(
        &self,
        category_id: Uuid,
        shift_to: Option<Uuid>,
    ) -> ResultEngine<u64> {
        if shift_to == Some(category_id) {
            return Err(EngineError::InvalidArgument(
                "cannot shift transactions to the removed category".to_string(),
            ));
        }

        let moved = with_tx!(self, |db_tx| {
            if !categories::exists(&db_tx, category_id).await? {
                return Err(EngineError::not_found("category", category_id));
            }
            if let Some(target) = shift_to
                && !categories::exists(&db_tx, target).await?
            {
                return Err(EngineError::not_found("category", target));
            }

            let moved = transactions::reassign_category(&db_tx, category_id, shift_to).await?;
            categories::Entity::delete_by_id(category_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok::<_, EngineError>(moved)
        })?;
        debug!(
            category_id = %category_id,
            shift_to = ?shift_to,
            transactions = moved,
            "category removed"
        );
        Ok(moved)
    }
}
