use serde_json::Value;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    cart::{CartAction, CartItem, CartLine, CartProduct, CartState, parse_stored_lines},
    db::OrmConn,
    dto::cart::{AddToCartRequest, CartView},
    entity::products::Entity as Products,
    error::{AppError, AppResult},
    middleware::session::keys,
    response::{ApiResponse, Meta},
    services::product_service::find_products,
    state::AppState,
};
use sea_orm::EntityTrait;

/// Request-scoped cart: the reducer state plus the session it persists to.
pub struct CartStore {
    session: Session,
    state: CartState,
}

impl CartStore {
    /// Loads the persisted lines and re-prices them from the catalog. Corrupt
    /// session data is discarded; products that are gone, hidden or sold out
    /// are dropped and quantities are clamped to current stock.
    pub async fn load(session: Session, orm: &OrmConn) -> AppResult<Self> {
        let lines = match session.get::<Value>(keys::CART).await? {
            None => Vec::new(),
            Some(raw) => match parse_stored_lines(raw) {
                Some(lines) => lines,
                None => {
                    tracing::warn!("discarding malformed session cart");
                    session.remove::<Value>(keys::CART).await?;
                    Vec::new()
                }
            },
        };

        let ids: Vec<Uuid> = lines.iter().map(|line| line.id).collect();
        let products = find_products(orm, &ids).await?;
        let items: Vec<CartItem> = lines
            .iter()
            .filter_map(|line| {
                let product = products
                    .iter()
                    .find(|p| p.id == line.id && p.quantity > 0)?;
                Some(CartItem {
                    product: CartProduct::from(product),
                    quantity: line.quantity.min(product.quantity),
                })
            })
            .collect();

        let mut store = Self {
            session,
            state: CartState::new(),
        };
        store.state.apply(CartAction::SetItems(items))?;
        if store.state.lines() != lines {
            store.persist().await?;
        }
        Ok(store)
    }

    pub fn state(&self) -> &CartState {
        &self.state
    }

    /// Applies `action` and persists the result. Nothing is written when the
    /// reducer rejects the action.
    pub async fn dispatch(&mut self, action: CartAction) -> AppResult<()> {
        self.state.apply(action)?;
        self.persist().await
    }

    async fn persist(&self) -> AppResult<()> {
        let lines: Vec<CartLine> = self.state.lines();
        self.session.insert(keys::CART, lines).await?;
        Ok(())
    }

    pub fn view(&self) -> CartView {
        CartView::from(&self.state)
    }
}

fn cart_response(store: &CartStore, message: &str) -> ApiResponse<CartView> {
    let view = store.view();
    let meta = Meta::count(view.items.len());
    ApiResponse::success(message, view, Some(meta))
}

pub async fn view_cart(state: &AppState, session: Session) -> AppResult<ApiResponse<CartView>> {
    let store = CartStore::load(session, &state.orm).await?;
    Ok(cart_response(&store, "Cart"))
}

pub async fn add_to_cart(
    state: &AppState,
    session: Session,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartView>> {
    let product = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .filter(|p| p.quantity >= 0)
        .ok_or(AppError::NotFound)?;

    let mut store = CartStore::load(session, &state.orm).await?;
    store
        .dispatch(CartAction::AddItem {
            product: CartProduct::from(&product),
            quantity: payload.quantity,
        })
        .await?;
    tracing::debug!(product_id = %product.id, quantity = payload.quantity, "added to cart");
    Ok(cart_response(&store, "Added to cart"))
}

pub async fn update_quantity(
    state: &AppState,
    session: Session,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<ApiResponse<CartView>> {
    let mut store = CartStore::load(session, &state.orm).await?;
    store
        .dispatch(CartAction::UpdateQuantity {
            id: product_id,
            quantity,
        })
        .await?;
    Ok(cart_response(&store, "Cart updated"))
}

pub async fn remove_from_cart(
    state: &AppState,
    session: Session,
    product_id: Uuid,
) -> AppResult<ApiResponse<CartView>> {
    let mut store = CartStore::load(session, &state.orm).await?;
    if store.state().quantity_of(product_id) == 0 {
        return Err(AppError::NotFound);
    }
    store.dispatch(CartAction::RemoveItem(product_id)).await?;
    Ok(cart_response(&store, "Removed from cart"))
}

pub async fn clear_cart(state: &AppState, session: Session) -> AppResult<ApiResponse<CartView>> {
    let mut store = CartStore::load(session, &state.orm).await?;
    store.dispatch(CartAction::ClearCart).await?;
    Ok(cart_response(&store, "Cart cleared"))
}
