// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT


use anyhow::Result;
use indoc::indoc;
use oxisling::{MemoryTree, ResolverConfig, ServletResolver};

/// Content shared by every integration test.
///
/// Holds a page component `shop/product` inheriting from `shop/page`, with
/// scripts spread over `/apps` and `/libs`.
pub(crate) const SHOP_CONTENT: &str = indoc! {r#"
    [[resource]]
    path = "/content/shop/shirt"
    type = "shop:product"

    [[resource]]
    path = "/content/shop/home"
    type = "shop/page"

    [[resource]]
    path = "/content/raw"
    type = "/apps/shop/raw.esp"

    [[resource]]
    path = "/apps/shop/product"
    type = "sling:Folder"
    super_type = "shop/page"

    [[resource]]
    path = "/apps/shop/product/html.esp"

    [[resource]]
    path = "/apps/shop/product/print.html.esp"

    [[resource]]
    path = "/apps/shop/product/print.a4.html.esp"

    [[resource]]
    path = "/apps/shop/product/print/letter.html.esp"

    [[resource]]
    path = "/apps/shop/product/POST.esp"

    [[resource]]
    path = "/apps/shop/raw.esp"

    [[resource]]
    path = "/libs/shop/product/html.esp"

    [[resource]]
    path = "/libs/shop/page/page.esp"

    [[resource]]
    path = "/libs/shop/page/json.esp"

    [[resource]]
    path = "/libs/shop/page.servlet"

    [[resource]]
    path = "/libs/shop/parts/header.html.esp"

    [[resource]]
    path = "/libs/sling/servlet/default/GET.servlet"

    [[resource]]
    path = "/libs/sling/servlet/errorhandler/404.esp"

    [[resource]]
    path = "/libs/sling/servlet/errorhandler/default.esp"
"#};

pub(crate) struct ShopFixture {
    resolver: ServletResolver,
}

impl ShopFixture {
    pub(crate) fn new() -> Result<Self> {
        Self::with_config(ResolverConfig::default())
    }

    pub(crate) fn with_config(config: ResolverConfig) -> Result<Self> {
        let tree: MemoryTree = SHOP_CONTENT.parse()?;
        Ok(Self {
            resolver: ServletResolver::new(config, tree),
        })
    }

    pub(crate) fn resolver(&self) -> &ServletResolver {
        &self.resolver
    }
}

pub(crate) fn paths(resources: impl IntoIterator<Item = oxisling::Resource>) -> Vec<String> {
    resources
        .into_iter()
        .map(|resource| resource.path().to_owned())
        .collect()
}
