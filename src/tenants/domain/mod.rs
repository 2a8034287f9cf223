pub mod currency_code;
pub mod tenant_name;
pub mod tenants;
