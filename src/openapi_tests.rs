#[cfg(test)]
mod tests {
    use crate::schemas::ApiDoc;
    use utoipa::openapi::{schema::Schema, PathItemType, RefOr};
    use utoipa::OpenApi;

    fn object_properties(name: &str) -> Vec<String> {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();
        match components.schemas.get(name) {
            Some(RefOr::T(Schema::Object(obj))) => obj.properties.keys().cloned().collect(),
            _ => panic!("{} should be an object schema", name),
        }
    }

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();

        assert!(openapi.components.is_some());
        let components = openapi.components.as_ref().unwrap();
        assert!(components.schemas.contains_key("ErrorResponse"));
        assert!(components.schemas.contains_key("HealthResponse"));
        assert!(components.schemas.contains_key("CustomerDetailResponse"));
        assert!(components.schemas.contains_key("ReplaceContentRequest"));

        assert!(serde_json::to_string(&openapi).is_ok());
    }

    #[test]
    fn test_error_response_schema_structure() {
        let properties = object_properties("ErrorResponse");

        assert!(properties.contains(&"error".to_string()));
        assert!(properties.contains(&"code".to_string()));
        assert!(properties.contains(&"success".to_string()));
    }

    #[test]
    fn test_health_response_schema_structure() {
        let properties = object_properties("HealthResponse");

        assert!(properties.contains(&"status".to_string()));
        assert!(properties.contains(&"version".to_string()));
        assert!(properties.contains(&"database".to_string()));
    }

    #[test]
    fn test_openapi_paths_contain_health_endpoint() {
        let openapi = ApiDoc::openapi();

        let health_path = openapi.paths.paths.get("/health").unwrap();
        let health_get = health_path.operations.get(&PathItemType::Get).unwrap();

        let responses = &health_get.responses;
        assert!(responses.responses.contains_key("200"));
        assert!(responses.responses.contains_key("500"));
    }

    #[test]
    fn test_customer_lookup_documents_both_bodies() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();

        match components.schemas.get("CustomerLookup") {
            Some(RefOr::T(Schema::OneOf(one_of))) => assert_eq!(one_of.items.len(), 2),
            _ => panic!("CustomerLookup should be a oneOf schema"),
        }
        let rendered = serde_json::to_string(components.schemas.get("CustomerLookup").unwrap())
            .unwrap();
        assert!(rendered.contains("CustomerDetailResponse"));

        let customers = openapi.paths.paths.get("/api/customers").unwrap();
        let get = customers.operations.get(&PathItemType::Get).unwrap();
        let ok = serde_json::to_string(get.responses.responses.get("200").unwrap()).unwrap();
        assert!(ok.contains("CustomerDetailResponse"));
    }

    #[test]
    fn test_customer_and_tax_return_operations() {
        let openapi = ApiDoc::openapi();

        for path in ["/api/customers", "/api/tax-returns"] {
            let item = openapi.paths.paths.get(path).unwrap();
            for (operation, method) in [
                (PathItemType::Get, "GET"),
                (PathItemType::Post, "POST"),
                (PathItemType::Patch, "PATCH"),
                (PathItemType::Delete, "DELETE"),
            ] {
                assert!(
                    item.operations.contains_key(&operation),
                    "{} is missing {}",
                    path,
                    method
                );
            }
        }

        let generate = openapi.paths.paths.get("/api/tax-returns/generate").unwrap();
        assert!(generate.operations.contains_key(&PathItemType::Post));
        let preview = openapi.paths.paths.get("/api/tax-returns/preview").unwrap();
        assert!(preview.operations.contains_key(&PathItemType::Get));
    }

    #[test]
    fn test_content_paths_document_conflicts() {
        let openapi = ApiDoc::openapi();

        let content = openapi.paths.paths.get("/api/content/{section}").unwrap();
        let put = content.operations.get(&PathItemType::Put).unwrap();
        assert!(put.responses.responses.contains_key("400"));
        assert!(openapi
            .paths
            .paths
            .contains_key("/api/content/{section}/section"));

        let tax_returns = openapi.paths.paths.get("/api/tax-returns").unwrap();
        let post = tax_returns.operations.get(&PathItemType::Post).unwrap();
        assert!(post.responses.responses.contains_key("409"));
    }

    #[test]
    fn test_all_error_responses_reference_correct_schema() {
        let openapi = ApiDoc::openapi();
        let openapi_json = serde_json::to_string(&openapi).unwrap();

        assert!(!openapi_json.contains("crate.schemas.ErrorResponse"));
        assert!(!openapi_json.contains("crate::schemas::ErrorResponse"));
        assert!(openapi_json.contains("#/components/schemas/ErrorResponse"));
    }
}
