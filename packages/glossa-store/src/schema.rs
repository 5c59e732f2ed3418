/// Catalog documents live as JSONB rows; the expression indexes cover the
/// fields the discovery and search paths filter or sort on.
pub fn render_schema() -> &'static str {
	"\
CREATE TABLE IF NOT EXISTS objects (
	id uuid PRIMARY KEY,
	doc jsonb NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS objects_image_hash_key
	ON objects ((doc->>'image_hash'));

CREATE INDEX IF NOT EXISTS objects_org_idx
	ON objects ((doc->>'org_id'));

CREATE INDEX IF NOT EXISTS objects_status_idx
	ON objects ((doc->>'image_status'));

CREATE INDEX IF NOT EXISTS objects_text_fts
	ON objects USING GIN (to_tsvector('english', COALESCE(doc->>'embedding_text', '')));

CREATE TABLE IF NOT EXISTS translations (
	id uuid PRIMARY KEY,
	doc jsonb NOT NULL
);

CREATE INDEX IF NOT EXISTS translations_object_idx
	ON translations ((doc->>'object_id'));

CREATE INDEX IF NOT EXISTS translations_language_idx
	ON translations ((doc->>'requested_language'))"
}
