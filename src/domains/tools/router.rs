//! Tool Router - builds the rmcp ToolRouter from the tool definitions.
//!
//! This module builds the ToolRouter for the STDIO transport by delegating
//! to the tool definitions themselves. Each tool knows how to create its own route.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;

use crate::core::context::AppContext;

use super::definitions::{
    CatalogSearchTool, HeavyRotationTool, LibraryAddTool, LibraryListTool, PlaylistAddTracksTool,
    PlaylistCreateTool, PlaylistTracksTool, RecentlyPlayedTool,
};

/// Build the tool router with all registered tools.
pub fn build_tool_router<S>(ctx: Arc<AppContext>) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    ToolRouter::new()
        .with_route(CatalogSearchTool::create_route(ctx.clone()))
        .with_route(HeavyRotationTool::create_route(ctx.clone()))
        .with_route(LibraryAddTool::create_route(ctx.clone()))
        .with_route(LibraryListTool::create_route(ctx.clone()))
        .with_route(PlaylistAddTracksTool::create_route(ctx.clone()))
        .with_route(PlaylistCreateTool::create_route(ctx.clone()))
        .with_route(PlaylistTracksTool::create_route(ctx.clone()))
        .with_route(RecentlyPlayedTool::create_route(ctx))
}

#[cfg(test)]
mod tests {
    use super::super::registry::ToolRegistry;
    use super::*;
    use crate::core::config::Config;

    struct TestServer {}

    fn test_ctx() -> Arc<AppContext> {
        AppContext::new(Arc::new(Config::default()))
    }

    #[test]
    fn test_build_router() {
        let router: ToolRouter<TestServer> = build_tool_router(test_ctx());
        let tools = router.list_all();
        assert_eq!(tools.len(), 8);

        let names: Vec<_> = tools.iter().map(|t| t.name.as_ref()).collect();
        assert!(names.contains(&"am_catalog_search"));
        assert!(names.contains(&"am_library_list"));
        assert!(names.contains(&"am_library_add"));
        assert!(names.contains(&"am_playlist_create"));
        assert!(names.contains(&"am_playlist_add_tracks"));
        assert!(names.contains(&"am_playlist_tracks"));
        assert!(names.contains(&"am_recently_played"));
        assert!(names.contains(&"am_heavy_rotation"));
    }

    #[test]
    fn test_registry_matches_router() {
        // Ensure registry and router have the same tools
        let ctx = test_ctx();
        let registry = ToolRegistry::new(ctx.clone());
        let registry_names = registry.tool_names();

        let router: ToolRouter<TestServer> = build_tool_router(ctx);
        let router_tools = router.list_all();
        let router_names: Vec<_> = router_tools.iter().map(|t| t.name.as_ref()).collect();

        assert_eq!(registry_names.len(), router_names.len());
        for name in registry_names {
            assert!(router_names.contains(&name));
        }
    }
}
