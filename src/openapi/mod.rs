use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MatrixInc API",
        version = "0.1.0",
        description = r#"
# MatrixInc Inventory & Order API

Customers, products, parts and orders of MatrixInc.

- **Orders**: placing, editing or cancelling an order moves product stock in the same transaction
- **Stock**: replenish products and parts, or correct a product's stock
- **Dashboard**: order count, revenue and new customers over a date range, with per-day series
- **Search**: product lookup and name suggestions

## Error Handling

Failures share one body:

```json
{
  "error": "Unprocessable Entity",
  "message": "Insufficient stock: Nebuchadnezzar (requested 3, available 2)",
  "request_id": "5b0c...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

## Pagination

`GET /customers` and `GET /orders` accept `page` (default 1) and `per_page`
(default 20, max 100).
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "customers", description = "Customer management"),
        (name = "products", description = "Product catalog"),
        (name = "parts", description = "Spare parts"),
        (name = "orders", description = "Orders and stock reconciliation"),
        (name = "stock", description = "Restocking and corrections"),
        (name = "dashboard", description = "Statistics"),
        (name = "search", description = "Catalog search")
    ),
    paths(
        crate::handlers::customers::list_customers,
        crate::handlers::customers::create_customer,
        crate::handlers::customers::get_customer,
        crate::handlers::customers::update_customer,
        crate::handlers::customers::delete_customer,

        crate::handlers::products::list_products,
        crate::handlers::products::create_product,
        crate::handlers::products::get_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::link_part,
        crate::handlers::products::unlink_part,

        crate::handlers::parts::list_parts,
        crate::handlers::parts::create_part,
        crate::handlers::parts::get_part,
        crate::handlers::parts::update_part,
        crate::handlers::parts::delete_part,

        crate::handlers::orders::list_orders,
        crate::handlers::orders::create_order,
        crate::handlers::orders::order_options,
        crate::handlers::orders::get_order,
        crate::handlers::orders::edit_order,
        crate::handlers::orders::delete_order,

        crate::handlers::stock::stock_overview,
        crate::handlers::stock::restock,
        crate::handlers::stock::adjust_product_stock,

        crate::handlers::dashboard::get_dashboard,

        crate::handlers::search::search,
        crate::handlers::search::suggestions,
    ),
    components(
        schemas(
            crate::events::StockItemKind,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
