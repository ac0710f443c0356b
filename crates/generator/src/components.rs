//! Leptos SSR components. Everything renders straight to strings; there is
//! no hydration and no client-side state.

use docsite_kit_core::{NavPosition, Site};
use leptos::prelude::*;

/// One homepage feature card entry.
pub struct Feature {
    pub title: &'static str,
    pub icon: &'static str,
    pub to: &'static str,
    pub description: &'static str,
}

/// The authored feature-card list: fixed content, fixed order.
pub const FEATURES: [Feature; 3] = [
    Feature {
        title: "Data Science Notes",
        icon: "/img/undraw_docusaurus_mountain.svg",
        to: "/data-science-notes/intro",
        description: "An open-source collection of notes across varying topics on data science.",
    },
    Feature {
        title: "Making Use of Data",
        icon: "/img/undraw_docusaurus_tree.svg",
        to: "/making-use-of-data/intro",
        description: "How can data be leveraged to better organizational bottom lines?",
    },
    Feature {
        title: "OneLoneDatum Blog",
        icon: "/img/undraw_docusaurus_react.svg",
        to: "/blog",
        description: "Why is the Datum so lonely?",
    },
];

/// Top-of-page banner: site title and tagline verbatim, one call to action.
#[component]
fn Hero(title: String, tagline: String, cta: String) -> impl IntoView {
    view! {
        <header class="hero hero--primary">
            <h1 class="hero__title">{title}</h1>
            <p class="hero__subtitle">{tagline}</p>
            <a class="button hero__cta" href=cta>
                "Learn More Here..."
            </a>
            <hr class="hero__rule"/>
        </header>
    }
}

/// A single feature card, keyed by its position in the authored list.
#[component]
fn FeatureCard(
    index: usize,
    title: &'static str,
    icon: &'static str,
    to: &'static str,
    description: &'static str,
) -> impl IntoView {
    view! {
        <div class="col" data-index=index.to_string()>
            <a class="feature__link" href=to>
                <div class="text--center">
                    <img class="feature__icon" src=icon alt="" role="img"/>
                </div>
                <div class="text--center padding-horiz--md">
                    <h3>{title}</h3>
                    <p>{description}</p>
                </div>
            </a>
        </div>
    }
}

#[component]
fn FeatureList() -> impl IntoView {
    view! {
        <section class="features">
            <div class="container">
                <div class="row">
                    {FEATURES
                        .iter()
                        .enumerate()
                        .map(|(index, feature)| {
                            view! {
                                <FeatureCard
                                    index=index
                                    title=feature.title
                                    icon=feature.icon
                                    to=feature.to
                                    description=feature.description
                                />
                            }
                        })
                        .collect_view()}
                </div>
            </div>
        </section>
    }
}

pub fn hero_html(site: &Site) -> String {
    let title = site.meta.title.clone();
    let tagline = site.meta.tagline.clone();
    let cta = site.absolute_route("/docs/intro");
    view! { <Hero title=title tagline=tagline cta=cta/> }.to_html()
}

pub fn feature_list_html() -> String {
    view! { <FeatureList/> }.to_html()
}

pub fn navbar_html(site: &Site) -> String {
    let navbar_class = if site.navbar.hide_on_scroll {
        "navbar navbar--hide-on-scroll"
    } else {
        "navbar"
    };

    let logo = site.navbar.logo.as_ref().map(|logo| {
        let src = site.asset_url(&logo.src);
        let alt = logo.alt.clone();
        view! { <img class="navbar__logo" src=src alt=alt/> }
    });

    let title = site.navbar.title.clone();
    let home = site.absolute_route("/");
    let left = nav_items(site, NavPosition::Left);
    let right = nav_items(site, NavPosition::Right);

    view! {
        <nav class=navbar_class>
            <div class="navbar__inner">
                <div class="navbar__items">
                    <a class="navbar__brand" href=home>
                        {logo}
                        <span class="navbar__title">{title}</span>
                    </a>
                    {left}
                </div>
                <div class="navbar__items navbar__items--right">{right}</div>
            </div>
        </nav>
    }
    .to_html()
}

fn nav_items(site: &Site, position: NavPosition) -> impl IntoView {
    site.navbar
        .items
        .iter()
        .filter(|item| item.position == position)
        .map(|item| {
            let href = if item.is_internal() {
                site.absolute_route(item.destination())
            } else {
                item.destination().to_string()
            };
            let label = item.label.clone();
            let active_regex = item.active_base_regex.clone();
            view! {
                <a class="navbar__item navbar__link" href=href data-active-regex=active_regex>
                    {label}
                </a>
            }
        })
        .collect_view()
}

pub fn footer_html(site: &Site) -> String {
    let footer_class = format!("footer footer--{}", site.footer.style);

    let groups = site
        .footer
        .groups
        .iter()
        .map(|group| {
            let title = group.title.clone();
            let links = group
                .links
                .iter()
                .map(|link| {
                    let href = if link.is_internal() {
                        site.absolute_route(&link.to)
                    } else {
                        link.to.clone()
                    };
                    let label = link.label.clone();
                    view! {
                        <li class="footer__item">
                            <a class="footer__link" href=href>{label}</a>
                        </li>
                    }
                })
                .collect_view();
            view! {
                <div class="col footer__col">
                    <div class="footer__title">{title}</div>
                    <ul class="footer__items">{links}</ul>
                </div>
            }
        })
        .collect_view();

    let copyright = site.footer.copyright.clone();

    view! {
        <footer class=footer_class>
            <div class="container">
                <div class="row">{groups}</div>
                <div class="footer__bottom text--center">
                    <div class="footer__copyright">{copyright}</div>
                </div>
            </div>
        </footer>
    }
    .to_html()
}
