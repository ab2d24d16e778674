//! Integration tests for search
//!
//! Every test builds a small library in a temporary SQLite database and runs
//! complete search requests against it: tag matching, text filters, bookmarks,
//! exclusions, ordering and pagination.

mod helpers;

use helpers::*;
use mediadex_core::{
	search::{
		build_rule_items_query,
		filters::*,
		search, Filter, OrderBy, OrderParams, QueryFilters, QueryParams, RuleItemFilters,
		SearchQuery, SortDirection, TagFilter,
	},
	SearchError,
};
use pretty_assertions::assert_eq;
use sea_orm::ConnectionTrait;

fn tags_query(tags: TagFilter) -> SearchQuery {
	SearchQuery {
		query: QueryParams {
			tags,
			..Default::default()
		},
		order: unbounded(),
		..Default::default()
	}
}

fn filters_query(filters: QueryFilters) -> SearchQuery {
	SearchQuery {
		query: QueryParams {
			filters,
			..Default::default()
		},
		order: unbounded(),
		..Default::default()
	}
}

fn unbounded() -> OrderParams {
	OrderParams {
		page_size: Some(0),
		..Default::default()
	}
}

fn strings(values: &[&str]) -> Vec<String> {
	values.iter().map(|v| v.to_string()).collect()
}

fn path_text(query: &str) -> PathTextFilter {
	PathTextFilter {
		query: query.into(),
		..Default::default()
	}
}

#[tokio::test]
async fn test_match_all_tag_newest_first() {
	let library = TestLibrary::new().await;

	let old = library.add_image("a1", "/photos/old.jpg", 1).await;
	let new = library.add_image("b2", "/photos/new.jpg", 5).await;
	let other = library.add_image("c3", "/photos/other.jpg", 9).await;
	library.tag(old, "rating", "rating:safe", "wd14", 0.9).await;
	library.tag(new, "rating", "rating:safe", "wd14", 0.8).await;
	library.tag(other, "rating", "rating:explicit", "wd14", 0.9).await;

	let (total, results) = library
		.run(tags_query(TagFilter {
			pos_match_all: strings(&["rating:safe"]),
			..Default::default()
		}))
		.await;

	assert_eq!(total, 2);
	let paths: Vec<_> = results.iter().map(|r| r.path.as_str()).collect();
	assert_eq!(paths, vec!["/photos/new.jpg", "/photos/old.jpg"]);
	assert_eq!(results[0].sha256, "b2");
	assert_eq!(results[0].mime_type.as_deref(), Some("image/jpeg"));
	assert_eq!(results[0].last_modified.to_rfc3339(), "2024-01-05T12:00:00+00:00");
}

#[tokio::test]
async fn test_match_any_is_a_union() {
	let library = TestLibrary::new().await;

	let cat = library.add_image("01", "/a/cat.jpg", 1).await;
	let dog = library.add_image("02", "/a/dog.jpg", 2).await;
	let both = library.add_image("03", "/a/both.jpg", 3).await;
	library.add_image("04", "/a/none.jpg", 4).await;
	library.simple_tag(cat, "cat").await;
	library.simple_tag(dog, "dog").await;
	library.simple_tag(both, "cat").await;
	library.simple_tag(both, "dog").await;

	let paths = library
		.paths(tags_query(TagFilter {
			pos_match_any: strings(&["cat", "dog"]),
			..Default::default()
		}))
		.await;

	assert_eq!(paths, vec!["/a/both.jpg", "/a/dog.jpg", "/a/cat.jpg"]);
}

#[tokio::test]
async fn test_negative_match_all_needs_every_tag() {
	let library = TestLibrary::new().await;

	let both = library.add_image("01", "/a/both.jpg", 1).await;
	let watermark = library.add_image("02", "/a/watermark.jpg", 2).await;
	library.add_image("03", "/a/clean.jpg", 3).await;
	library.simple_tag(both, "watermark").await;
	library.simple_tag(both, "low_quality").await;
	library.simple_tag(watermark, "watermark").await;

	let paths = library
		.paths(tags_query(TagFilter {
			neg_match_all: strings(&["watermark", "low_quality"]),
			..Default::default()
		}))
		.await;

	assert_eq!(paths, vec!["/a/clean.jpg", "/a/watermark.jpg"]);
}

#[tokio::test]
async fn test_tag_restrictions() {
	let library = TestLibrary::new().await;

	let confident = library.add_image("01", "/a/confident.jpg", 1).await;
	let unsure = library.add_image("02", "/a/unsure.jpg", 2).await;
	let other_setter = library.add_image("03", "/a/other.jpg", 3).await;
	let both_setters = library.add_image("04", "/a/both.jpg", 4).await;
	library.tag(confident, "character", "cat", "wd14", 0.9).await;
	library.tag(unsure, "character", "cat", "wd14", 0.2).await;
	library.tag(other_setter, "general", "cat", "clip", 0.9).await;
	library.tag(both_setters, "character", "cat", "wd14", 0.9).await;
	library.tag(both_setters, "character", "cat", "clip", 0.9).await;

	let cat = |f: fn(&mut TagFilter)| {
		let mut tags = TagFilter {
			pos_match_all: strings(&["cat"]),
			..Default::default()
		};
		f(&mut tags);
		tags_query(tags)
	};

	assert_eq!(
		library.paths(cat(|t| t.min_confidence = Some(0.5))).await,
		vec!["/a/both.jpg", "/a/other.jpg", "/a/confident.jpg"]
	);
	assert_eq!(
		library.paths(cat(|t| t.setters = strings(&["wd14"]))).await,
		vec!["/a/both.jpg", "/a/unsure.jpg", "/a/confident.jpg"]
	);
	assert_eq!(
		library.paths(cat(|t| t.namespaces = strings(&["char"]))).await,
		vec!["/a/both.jpg", "/a/unsure.jpg", "/a/confident.jpg"]
	);
	assert_eq!(
		library
			.paths(cat(|t| {
				t.setters = strings(&["wd14", "clip"]);
				t.all_setters_required = true;
			}))
			.await,
		vec!["/a/both.jpg"]
	);
}

#[tokio::test]
async fn test_configured_confidence_floor() {
	let mut library = TestLibrary::new().await;

	let high = library.add_image("01", "/a/high.jpg", 1).await;
	let low = library.add_image("02", "/a/low.jpg", 2).await;
	library.tag(high, "general", "cat", "wd14", 0.9).await;
	library.tag(low, "general", "cat", "wd14", 0.1).await;

	library.config.min_tag_confidence = Some(0.5);
	let tags = TagFilter {
		pos_match_all: strings(&["cat"]),
		..Default::default()
	};

	assert_eq!(library.paths(tags_query(tags.clone())).await, vec!["/a/high.jpg"]);

	// The filter's own floor wins over the configured one
	let paths = library
		.paths(tags_query(TagFilter {
			min_confidence: Some(0.05),
			..tags
		}))
		.await;
	assert_eq!(paths, vec!["/a/low.jpg", "/a/high.jpg"]);
}

#[tokio::test]
async fn test_count_matches_unbounded_fetch() {
	let library = TestLibrary::new().await;

	for day in 1..=12 {
		let item = library
			.add_image(&format!("{day:02}"), &format!("/lib/beach/{day}.jpg"), day)
			.await;
		if day % 2 == 0 {
			library.simple_tag(item, "sea").await;
		}
		if day % 3 == 0 {
			library.bookmark(item, "favorites", "user", day).await;
		}
		// A second copy of the same content
		if day % 4 == 0 {
			library
				.add_file(item, &format!("/backup/beach/{day}.jpg"), &day_of_january(day))
				.await;
		}
	}

	let queries = vec![
		SearchQuery {
			order: unbounded(),
			..Default::default()
		},
		tags_query(TagFilter {
			pos_match_all: strings(&["sea"]),
			..Default::default()
		}),
		filters_query(QueryFilters {
			bookmarks: Some(BookmarksFilter::default()),
			path_text: Some(path_text("beach")),
			..Default::default()
		}),
		filters_query(QueryFilters {
			files: Some(MatchFiles {
				path_prefixes: strings(&["/backup/"]),
				..Default::default()
			}),
			..Default::default()
		}),
	];

	for query in queries {
		let (total, results) = library.run(query.clone()).await;
		assert_eq!(total as usize, results.len(), "{query:?}");
	}

	let (total, results) = library
		.run(SearchQuery {
			order: unbounded(),
			..Default::default()
		})
		.await;
	assert_eq!(total, 15);
	assert_eq!(results.len(), 15);
}

#[tokio::test]
async fn test_pages_concatenate_to_one_large_page() {
	let library = TestLibrary::new().await;

	// Shared timestamps leave the file id to break ties
	for i in 0..9u32 {
		library
			.add_image(&format!("{i:02}"), &format!("/lib/{i}.jpg"), 1 + i / 3)
			.await;
	}

	let page = |page: i64, page_size: u64, order_by: Option<OrderBy>| SearchQuery {
		order: OrderParams {
			order_by,
			page,
			page_size: Some(page_size),
			..Default::default()
		},
		..Default::default()
	};

	for order_by in [None, Some(OrderBy::Path)] {
		let mut concatenated = Vec::new();
		for n in 1..=4 {
			concatenated.extend(library.paths(page(n, 2, order_by)).await);
		}
		let single = library.paths(page(1, 8, order_by)).await;

		assert_eq!(concatenated.len(), 8);
		assert_eq!(concatenated, single);
	}

	// Below the first page is the first page
	assert_eq!(
		library.paths(page(0, 3, None)).await,
		library.paths(page(1, 3, None)).await
	);
	assert_eq!(
		library.paths(page(-7, 3, None)).await,
		library.paths(page(1, 3, None)).await
	);

	// An unbounded page holds everything, and there is nothing after it
	assert_eq!(library.paths(page(1, 0, None)).await.len(), 9);
	assert!(library.paths(page(2, 0, None)).await.is_empty());
}

#[tokio::test]
async fn test_bookmarks_only_intersect() {
	let library = TestLibrary::new().await;

	let beach = library.add_image("01", "/trips/beach.jpg", 1).await;
	let beach_bar = library.add_image("02", "/trips/beach_bar.jpg", 2).await;
	let mountain = library.add_image("03", "/trips/mountain.jpg", 3).await;
	library.bookmark(beach, "favorites", "user", 10).await;
	library.bookmark(mountain, "favorites", "user", 11).await;
	library.bookmark(beach_bar, "favorites", "someone_else", 12).await;

	let without = library
		.paths(filters_query(QueryFilters {
			path_text: Some(path_text("beach")),
			..Default::default()
		}))
		.await;
	let bookmarks = library
		.paths(filters_query(QueryFilters {
			bookmarks: Some(BookmarksFilter::default()),
			..Default::default()
		}))
		.await;
	let with = library
		.paths(filters_query(QueryFilters {
			path_text: Some(path_text("beach")),
			bookmarks: Some(BookmarksFilter::default()),
			..Default::default()
		}))
		.await;

	assert_eq!(without.len(), 2);
	// Latest bookmark first
	assert_eq!(bookmarks, vec!["/trips/mountain.jpg", "/trips/beach.jpg"]);
	assert_eq!(with, vec!["/trips/beach.jpg"]);
	assert!(with.iter().all(|p| without.contains(p) && bookmarks.contains(p)));
}

#[tokio::test]
async fn test_wildcard_bookmarks() {
	let library = TestLibrary::new().await;

	let shared = library.add_image("01", "/a/shared.jpg", 1).await;
	let own = library.add_image("02", "/a/own.jpg", 2).await;
	library.bookmark(shared, "default", "*", 1).await;
	library.bookmark(own, "default", "user", 2).await;

	let bookmarks = |include_wildcard| {
		filters_query(QueryFilters {
			bookmarks: Some(BookmarksFilter {
				include_wildcard,
				..Default::default()
			}),
			..Default::default()
		})
	};

	assert_eq!(
		library.paths(bookmarks(true)).await,
		vec!["/a/own.jpg", "/a/shared.jpg"]
	);
	assert_eq!(library.paths(bookmarks(false)).await, vec!["/a/own.jpg"]);
}

#[tokio::test]
async fn test_extracted_text_ranks_each_file_once() {
	let library = TestLibrary::new().await;

	let invoice = library.add_image("01", "/scans/a.png", 1).await;
	let receipt = library.add_image("02", "/scans/b.png", 2).await;
	library.add_image("03", "/scans/c.png", 3).await;
	library
		.add_text(invoice, "tesseract", "en", "invoice invoice invoice total due")
		.await;
	library
		.add_text(invoice, "florence", "en", "an invoice on a desk")
		.await;
	library
		.add_text(receipt, "tesseract", "en", "receipt with a short invoice number and many other words")
		.await;

	let (total, results) = library
		.run(filters_query(QueryFilters {
			extracted_text: Some(ExtractedTextFilter {
				query: "invoice".into(),
				..Default::default()
			}),
			..Default::default()
		}))
		.await;

	assert_eq!(total, 2);
	let paths: Vec<_> = results.iter().map(|r| r.path.as_str()).collect();
	assert_eq!(paths, vec!["/scans/a.png", "/scans/b.png"]);

	let only_florence = library
		.paths(filters_query(QueryFilters {
			extracted_text: Some(ExtractedTextFilter {
				query: "invoice".into(),
				setters: strings(&["florence"]),
				..Default::default()
			}),
			..Default::default()
		}))
		.await;
	assert_eq!(only_florence, vec!["/scans/a.png"]);
}

#[tokio::test]
async fn test_any_text_searches_paths_and_text() {
	let library = TestLibrary::new().await;

	let by_path = library.add_image("01", "/albums/sunset/1.jpg", 1).await;
	let by_text = library.add_image("02", "/albums/misc/2.jpg", 2).await;
	library.add_image("03", "/albums/misc/3.jpg", 3).await;
	library
		.add_text(by_text, "florence", "en", "a sunset over the sea")
		.await;
	library.add_text(by_path, "florence", "en", "a beach").await;

	let any_text = |include_path, include_extracted_text| {
		filters_query(QueryFilters {
			any_text: Some(AnyTextFilter {
				query: "sunset".into(),
				include_path,
				include_extracted_text,
				..Default::default()
			}),
			..Default::default()
		})
	};

	let mut both = library.paths(any_text(true, true)).await;
	both.sort();
	assert_eq!(both, vec!["/albums/misc/2.jpg", "/albums/sunset/1.jpg"]);
	assert_eq!(library.paths(any_text(true, false)).await, vec!["/albums/sunset/1.jpg"]);
	assert_eq!(library.paths(any_text(false, true)).await, vec!["/albums/misc/2.jpg"]);
}

#[tokio::test]
async fn test_file_matching() {
	let library = TestLibrary::new().await;

	let small = library.add_item("01", "image/png", 100).await;
	library.add_file(small, "/media/small.png", &day_of_january(1)).await;
	let large = library.add_item("02", "image/png", 10_000).await;
	library.add_file(large, "/media/large.png", &day_of_january(2)).await;
	let video = library.add_item("03", "video/mp4", 50_000).await;
	library.add_file(video, "/other/clip.mp4", &day_of_january(3)).await;

	let files = |files: MatchFiles| {
		filters_query(QueryFilters {
			files: Some(files),
			..Default::default()
		})
	};

	assert_eq!(
		library
			.paths(files(MatchFiles {
				mime_types: strings(&["image/"]),
				min_size: Some(1000),
				..Default::default()
			}))
			.await,
		vec!["/media/large.png"]
	);
	assert_eq!(
		library
			.paths(files(MatchFiles {
				path_prefixes: strings(&["/other/"]),
				..Default::default()
			}))
			.await,
		vec!["/other/clip.mp4"]
	);
	assert_eq!(
		library
			.paths(files(MatchFiles {
				mime_types: strings(&["video/", "image/png"]),
				max_size: Some(100),
				..Default::default()
			}))
			.await,
		vec!["/media/small.png"]
	);
}

#[tokio::test]
async fn test_excluded_filters_are_unioned() {
	let library = TestLibrary::new().await;

	let hidden = library.add_image("01", "/lib/hidden.jpg", 1).await;
	library.add_image("02", "/lib/draft.jpg", 2).await;
	library.add_image("03", "/lib/kept.jpg", 3).await;
	let both = library.add_image("04", "/lib/draft_hidden.jpg", 4).await;
	library.bookmark(hidden, "hidden", "user", 1).await;
	library.bookmark(both, "hidden", "user", 1).await;

	let query = SearchQuery {
		query: QueryParams {
			exclude: vec![
				Filter::PathText(path_text("draft")),
				Filter::Bookmarks(BookmarksFilter {
					namespaces: strings(&["hidden"]),
					..Default::default()
				}),
				// Invalid, ignored
				Filter::PathText(path_text("")),
			],
			..Default::default()
		},
		order: unbounded(),
		..Default::default()
	};

	let (total, results) = library.run(query).await;
	assert_eq!(total, 1);
	assert_eq!(results[0].path, "/lib/kept.jpg");
}

#[tokio::test]
async fn test_unknown_rank_falls_back_to_newest_first() {
	let library = TestLibrary::new().await;

	library.add_image("01", "/a/1.jpg", 1).await;
	library.add_image("02", "/a/2.jpg", 2).await;

	let paths = library
		.paths(SearchQuery {
			order: OrderParams {
				order_by: Some(OrderBy::RankFts),
				order: Some(SortDirection::Asc),
				..Default::default()
			},
			..Default::default()
		})
		.await;

	assert_eq!(paths, vec!["/a/2.jpg", "/a/1.jpg"]);
}

#[tokio::test]
async fn test_missing_files_are_dropped_but_counted() {
	let library = TestLibrary::new().await;

	let present = library.real_path("present.jpg");
	let item = library.add_item("01", "image/jpeg", 10).await;
	library.add_file(item, &present, &day_of_january(1)).await;
	library.add_image("02", "/does/not/exist.jpg", 2).await;

	let (total, results) = library
		.run(SearchQuery {
			check_path: Some(true),
			..Default::default()
		})
		.await;

	assert_eq!(total, 2);
	assert_eq!(results.len(), 1);
	assert_eq!(results[0].path, present);

	let (_, unchecked) = library
		.run(SearchQuery {
			check_path: Some(false),
			..Default::default()
		})
		.await;
	assert_eq!(unchecked.len(), 2);
}

#[tokio::test]
async fn test_total_is_zero_without_count() {
	let library = TestLibrary::new().await;
	library.add_image("01", "/a/1.jpg", 1).await;

	let (total, results) = library
		.run(SearchQuery {
			count: false,
			..Default::default()
		})
		.await;

	assert_eq!(total, 0);
	assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_empty_library_is_not_an_error() {
	let library = TestLibrary::new().await;

	let (total, results) = library
		.run(filters_query(QueryFilters {
			path_text: Some(path_text("anything")),
			..Default::default()
		}))
		.await;

	assert_eq!(total, 0);
	assert!(results.is_empty());
}

#[tokio::test]
async fn test_malformed_match_surfaces_store_error() {
	let library = TestLibrary::new().await;
	library.add_image("01", "/a/1.jpg", 1).await;

	let result = search(
		&library.conn,
		&library.config,
		filters_query(QueryFilters {
			path_text: Some(path_text("\"unterminated")),
			..Default::default()
		}),
	)
	.await;

	match result {
		Err(SearchError::Query { sql, .. }) => assert!(sql.starts_with("SELECT COUNT(*)")),
		Err(e) => panic!("unexpected error: {e}"),
		Ok(_) => panic!("malformed match should fail"),
	}
}

#[tokio::test]
async fn test_rule_query_selects_items() {
	let library = TestLibrary::new().await;

	let image = library.add_image("01", "/in/photo.jpg", 1).await;
	let screenshot = library.add_image("02", "/in/screenshot.jpg", 2).await;
	let video = library.add_item("03", "video/mp4", 10).await;
	library.add_file(video, "/in/clip.mp4", &day_of_january(3)).await;
	// Two files of one item still yield the item once
	library.add_file(image, "/copy/photo.jpg", &day_of_january(4)).await;

	let query = build_rule_items_query(&RuleItemFilters {
		positive: vec![Filter::Files(MatchFiles {
			mime_types: strings(&["image/"]),
			..Default::default()
		})],
		negative: vec![Filter::PathText(path_text("screenshot"))],
	})
	.unwrap();

	let rows = library.conn.query_all(query.into_statement()).await.unwrap();
	let items: Vec<i64> = rows
		.iter()
		.map(|row| row.try_get("", "item_id").unwrap())
		.collect();

	assert_eq!(items, vec![image]);
	assert!(!items.contains(&screenshot));
}
