use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    cart::{CartItem, CartProduct},
    checkout::{CheckoutStep, ShippingForm, ShippingInfo},
    dto::{
        auth::{LoginRequest, RegisterRequest},
        cart::{AddToCartRequest, CartView, UpdateCartItemRequest},
        checkout::{ReviewSummary, ShippingStep},
        images::{DeleteImagesRequest, DeletedImages, UploadedImages},
        orders::{OrderConfirmation, OrderList, OrderWithItems, UpdateOrderStatusRequest},
        payment::{CapturePaymentRequest, CreatePaymentOrderRequest, LineRequest},
        products::{ProductList, ProductRequest, UnhideRequest},
    },
    middleware::session::SESSION_COOKIE_NAME,
    models::{
        Availability, Category, Order, OrderItem, OrderStatus, Product, ShippingAddress,
        ShippingMethod, User,
    },
    payment::{CaptureDetails, ProviderOrder},
    pricing::OrderTotals,
    response::{ApiResponse, Meta},
    routes::{auth, cart, checkout, health, images, orders, params, payment, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE_NAME))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness,
        auth::register,
        auth::login,
        auth::logout,
        auth::me,
        products::list_shop,
        products::list_category,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::hide_product,
        products::unhide_product,
        products::list_all_products,
        cart::view_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        checkout::submit_shipping,
        checkout::review,
        checkout::edit,
        checkout::start_payment,
        checkout::complete,
        payment::create_order,
        payment::capture_payment,
        orders::list_orders,
        orders::get_order,
        orders::list_all_orders,
        orders::get_order_admin,
        orders::update_order_status,
        images::upload_images,
        images::delete_images
    ),
    components(
        schemas(
            User,
            Product,
            Category,
            Availability,
            Order,
            OrderItem,
            OrderStatus,
            ShippingAddress,
            ShippingMethod,
            CartItem,
            CartProduct,
            CartView,
            CheckoutStep,
            ShippingForm,
            ShippingInfo,
            ReviewSummary,
            ShippingStep,
            OrderTotals,
            ProviderOrder,
            CaptureDetails,
            LineRequest,
            CreatePaymentOrderRequest,
            CapturePaymentRequest,
            RegisterRequest,
            LoginRequest,
            ProductRequest,
            UnhideRequest,
            ProductList,
            AddToCartRequest,
            UpdateCartItemRequest,
            OrderList,
            OrderWithItems,
            OrderConfirmation,
            UpdateOrderStatusRequest,
            UploadedImages,
            DeleteImagesRequest,
            DeletedImages,
            params::Pagination,
            params::SortOrder,
            Meta,
            ApiResponse<User>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartView>,
            ApiResponse<ReviewSummary>,
            ApiResponse<ProviderOrder>,
            ApiResponse<OrderConfirmation>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Session sign-in endpoints"),
        (name = "Products", description = "Shop and catalog endpoints"),
        (name = "Cart", description = "Session cart endpoints"),
        (name = "Checkout", description = "Shipping, review and payment steps"),
        (name = "Payment", description = "PayPal order create and capture"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Admin", description = "Admin order endpoints"),
        (name = "Images", description = "Product image storage"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
