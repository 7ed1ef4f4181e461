pub mod mock_origin;
