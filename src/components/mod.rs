pub mod doc_canvas;
