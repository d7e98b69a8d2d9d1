use std::collections::BTreeMap;

use serde::Serialize;

use crate::{models::Film, pagination::Page};

pub const FILMS_PATH: &str = "/star-wars/movies";
const CURIE_NAME: &str = "ns";
const EMBEDDED_FILMS: &str = "ns:movies";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Link {
    pub href: String,
}

impl Link {
    fn new(href: String) -> Self {
        Self { href }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Curie {
    pub name: String,
    pub href: String,
    pub templated: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: Link,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<Link>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub curies: Vec<Curie>,
}

impl Links {
    fn only_self(href: String) -> Self {
        Self {
            self_link: Link::new(href),
            first: None,
            prev: None,
            next: None,
            last: None,
            curies: Vec::new(),
        }
    }
}

/// A film with its own `_links.self`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FilmResource {
    #[serde(rename = "_links")]
    pub links: Links,
    #[serde(flatten)]
    pub film: Film,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PagingInfo {
    pub count: u64,
    pub pages: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FilmCollection {
    #[serde(rename = "_links")]
    pub links: Links,
    #[serde(rename = "_embedded")]
    pub embedded: BTreeMap<String, Vec<FilmResource>>,
    pub info: PagingInfo,
}

/// Builds hypermedia envelopes rooted at the public base URI.
#[derive(Clone, Debug)]
pub struct Hypermedia {
    base_uri: String,
}

impl Hypermedia {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self { base_uri: base_uri.into().trim_end_matches('/').to_string() }
    }

    pub fn film(&self, film: Film) -> FilmResource {
        let href = format!("{}{FILMS_PATH}/{}", self.base_uri, film.id);
        FilmResource { links: Links::only_self(href), film }
    }

    pub fn collection(&self, page: Page) -> FilmCollection {
        let size = page.page_size;
        let page_href = |n: u64| Link::new(self.page_href(n, size));

        let links = Links {
            self_link: page_href(page.page_number),
            first: Some(page_href(1)),
            prev: page.prev_page.map(page_href),
            next: page.next_page.map(page_href),
            last: Some(page_href(page.total_pages)),
            curies: vec![Curie {
                name: CURIE_NAME.to_string(),
                href: self.base_uri.clone(),
                templated: true,
            }],
        };

        let info = PagingInfo { count: page.total_count, pages: page.total_pages };
        let films = page.items.into_iter().map(|film| self.film(film)).collect();

        FilmCollection {
            links,
            embedded: BTreeMap::from([(EMBEDDED_FILMS.to_string(), films)]),
            info,
        }
    }

    fn page_href(&self, page: u64, size: u64) -> String {
        format!("{}{FILMS_PATH}?page={page}&size={size}", self.base_uri)
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;
    use crate::{models::fixtures::a_new_hope, object_id::ObjectId, pagination::PageRequest};

    fn film() -> Film {
        let now = Timestamp::now();
        Film { id: ObjectId::generate(), details: a_new_hope(), created_at: now, edited_at: now }
    }

    fn hal() -> Hypermedia {
        Hypermedia::new("http://localhost:3000/")
    }

    #[test]
    fn film_resource_links_to_itself() {
        let film = film();
        let id = film.id;
        let json = serde_json::to_value(hal().film(film)).unwrap();

        let href = format!("http://localhost:3000/star-wars/movies/{id}");
        assert_eq!(json["_links"]["self"]["href"], href);
        assert_eq!(json["id"], id.to_hex());
        assert_eq!(json["title"], "A New Hope");
        assert!(json["_links"].get("next").is_none());
    }

    #[test]
    fn single_page_collection_has_no_prev_or_next() {
        let page = Page::assemble(PageRequest::new(1, 10).unwrap(), 1, vec![film()]);
        let json = serde_json::to_value(hal().collection(page)).unwrap();

        let links = &json["_links"];
        let only_page = "http://localhost:3000/star-wars/movies?page=1&size=10";
        assert_eq!(links["self"]["href"], only_page);
        assert_eq!(links["first"]["href"], only_page);
        assert_eq!(links["last"]["href"], only_page);
        assert!(links.get("prev").is_none());
        assert!(links.get("next").is_none());
        assert_eq!(links["curies"][0]["name"], "ns");
        assert_eq!(links["curies"][0]["templated"], true);

        assert_eq!(json["info"]["count"], 1);
        assert_eq!(json["info"]["pages"], 1);
        assert_eq!(json["_embedded"]["ns:movies"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn middle_page_links_both_ways_with_the_same_size() {
        let page = Page::assemble(PageRequest::new(2, 5).unwrap(), 12, vec![film(), film()]);
        let collection = hal().collection(page);

        assert_eq!(
            collection.links.prev.unwrap().href,
            "http://localhost:3000/star-wars/movies?page=1&size=5"
        );
        assert_eq!(
            collection.links.next.unwrap().href,
            "http://localhost:3000/star-wars/movies?page=3&size=5"
        );
        assert_eq!(
            collection.links.last.unwrap().href,
            "http://localhost:3000/star-wars/movies?page=3&size=5"
        );
        assert_eq!(collection.info, PagingInfo { count: 12, pages: 3 });
    }

    #[test]
    fn embedded_items_link_to_themselves_not_the_collection() {
        let items = vec![film(), film()];
        let ids: Vec<_> = items.iter().map(|f| f.id).collect();
        let page = Page::assemble(PageRequest::new(1, 10).unwrap(), 2, items);
        let collection = hal().collection(page);

        let embedded = &collection.embedded["ns:movies"];
        for (resource, id) in embedded.iter().zip(ids) {
            assert!(resource.links.self_link.href.ends_with(&format!("/star-wars/movies/{id}")));
        }
    }
}
